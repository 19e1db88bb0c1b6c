//! Named parameter blocks owned by each RegArch component.
//!
//! Purpose
//! -------
//! Give every mean, variance and distribution component one uniform parameter
//! store: an ordered list of named blocks (e.g. GARCH: `const`, `arch`,
//! `garch`). The block order is the order in which the component's slice
//! appears in the model-wide parameter vector.
//!
//! Key behaviors
//! -------------
//! - Scalar access by `(index, block)` or by `(name, index)`.
//! - Whole-block access by block number or by name.
//! - Explicit reallocation of resizable blocks (orders), which changes the
//!   component's parameter count consistently.
//! - Lossless round-trip against a flat vector at a given offset.
//! - Per-scalar labels for reporting tables.
//!
//! Invariants & assumptions
//! ------------------------
//! - Block names are unique within one component and matched
//!   case-insensitively.
//! - Fixed blocks (scalars such as `const` or `delta`) always hold exactly one
//!   value and refuse reallocation.
use crate::regarch::errors::{RegArchError, RegArchResult};
use ndarray::{Array1, ArrayView1, s};

#[derive(Debug, Clone, PartialEq)]
struct ParamBlock {
    name: &'static str,
    values: Array1<f64>,
    resizable: bool,
}

/// Ordered collection of named parameter blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamBlocks {
    blocks: Vec<ParamBlock>,
}

impl ParamBlocks {
    pub fn new() -> Self {
        ParamBlocks { blocks: Vec::new() }
    }

    /// Append a fixed single-value block.
    pub fn with_scalar(mut self, name: &'static str, value: f64) -> Self {
        self.blocks.push(ParamBlock { name, values: Array1::from_elem(1, value), resizable: false });
        self
    }

    /// Append a resizable zero-filled block of length `len`.
    pub fn with_vector(mut self, name: &'static str, len: usize) -> Self {
        self.blocks.push(ParamBlock { name, values: Array1::zeros(len), resizable: true });
        self
    }

    /// Total number of scalar parameters across all blocks.
    pub fn n_param(&self) -> usize {
        self.blocks.iter().map(|b| b.values.len()).sum()
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Block names in vector order.
    pub fn names(&self) -> Vec<&'static str> {
        self.blocks.iter().map(|b| b.name).collect()
    }

    /// One label per scalar, in vector order: `prefix.name` for fixed blocks,
    /// `prefix.name[k]` (1-based) for resizable ones.
    pub fn labels(&self, prefix: &str) -> Vec<String> {
        self.blocks
            .iter()
            .flat_map(|b| {
                (0..b.values.len()).map(move |k| {
                    if b.resizable {
                        format!("{prefix}.{}[{}]", b.name, k + 1)
                    } else {
                        format!("{prefix}.{}", b.name)
                    }
                })
            })
            .collect()
    }

    /// Length of block `block`; 0 for an unknown block.
    pub fn block_len(&self, block: usize) -> usize {
        self.blocks.get(block).map_or(0, |b| b.values.len())
    }

    /// Offset of block `block` inside the component slice.
    pub fn block_offset(&self, block: usize) -> usize {
        self.blocks.iter().take(block).map(|b| b.values.len()).sum()
    }

    /// View on block `block`. Components call this with their own, always-valid,
    /// block numbers.
    pub(crate) fn values(&self, block: usize) -> ArrayView1<'_, f64> {
        self.blocks[block].values.view()
    }

    /// First value of block `block`.
    pub(crate) fn scalar(&self, block: usize) -> f64 {
        self.blocks[block].values[0]
    }

    pub(crate) fn values_mut(&mut self, block: usize) -> &mut Array1<f64> {
        &mut self.blocks[block].values
    }

    pub fn get_value_index(&self, index: usize, block: usize) -> RegArchResult<f64> {
        let b = self.block_ref(block)?;
        b.values
            .get(index)
            .copied()
            .ok_or(RegArchError::ParamIndexOutOfRange { index, len: b.values.len() })
    }

    pub fn set_value_index(&mut self, value: f64, index: usize, block: usize) -> RegArchResult<()> {
        let b = self.block_mut(block)?;
        let len = b.values.len();
        match b.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RegArchError::ParamIndexOutOfRange { index, len }),
        }
    }

    pub fn get_value_name(&self, name: &str, index: usize) -> RegArchResult<f64> {
        self.get_value_index(index, self.block_by_name(name)?)
    }

    pub fn set_value_name(&mut self, value: f64, name: &str, index: usize) -> RegArchResult<()> {
        let block = self.block_by_name(name)?;
        self.set_value_index(value, index, block)
    }

    pub fn get_vector_index(&self, block: usize) -> RegArchResult<Array1<f64>> {
        Ok(self.block_ref(block)?.values.clone())
    }

    /// Overwrite block `block`; the length must equal the current block length.
    pub fn set_vector_index(&mut self, values: &Array1<f64>, block: usize) -> RegArchResult<()> {
        let b = self.block_mut(block)?;
        if values.len() != b.values.len() {
            return Err(RegArchError::ParamLengthMismatch {
                expected: b.values.len(),
                actual: values.len(),
            });
        }
        b.values.assign(values);
        Ok(())
    }

    pub fn get_vector_name(&self, name: &str) -> RegArchResult<Array1<f64>> {
        self.get_vector_index(self.block_by_name(name)?)
    }

    pub fn set_vector_name(&mut self, values: &Array1<f64>, name: &str) -> RegArchResult<()> {
        let block = self.block_by_name(name)?;
        self.set_vector_index(values, block)
    }

    /// Resize block `block` to `size`, zero-filling it.
    ///
    /// # Errors
    /// - [`RegArchError::InvalidOrder`] for fixed scalar blocks.
    pub fn realloc_block(&mut self, size: usize, block: usize) -> RegArchResult<()> {
        let b = self.block_mut(block)?;
        if !b.resizable {
            return Err(RegArchError::InvalidOrder {
                order: size,
                reason: "scalar parameter blocks cannot be resized",
            });
        }
        b.values = Array1::zeros(size);
        Ok(())
    }

    /// Replace block `block` with `values`, resizing it to `values.len()`.
    pub fn realloc_vect(&mut self, values: &Array1<f64>, block: usize) -> RegArchResult<()> {
        let b = self.block_mut(block)?;
        if !b.resizable && values.len() != 1 {
            return Err(RegArchError::InvalidOrder {
                order: values.len(),
                reason: "scalar parameter blocks cannot be resized",
            });
        }
        b.values = values.clone();
        Ok(())
    }

    /// Write all blocks, in order, into `dest[offset .. offset + n_param]`.
    pub fn to_vector(&self, dest: &mut Array1<f64>, offset: usize) -> RegArchResult<()> {
        let n = self.n_param();
        if offset + n > dest.len() {
            return Err(RegArchError::ParamLengthMismatch { expected: offset + n, actual: dest.len() });
        }
        let mut pos = offset;
        for b in &self.blocks {
            let len = b.values.len();
            dest.slice_mut(s![pos..pos + len]).assign(&b.values);
            pos += len;
        }
        Ok(())
    }

    /// Read all blocks, in order, from `src[offset .. offset + n_param]`.
    pub fn from_vector(&mut self, src: &Array1<f64>, offset: usize) -> RegArchResult<()> {
        let n = self.n_param();
        if offset + n > src.len() {
            return Err(RegArchError::ParamLengthMismatch { expected: offset + n, actual: src.len() });
        }
        let mut pos = offset;
        for b in &mut self.blocks {
            let len = b.values.len();
            b.values.assign(&src.slice(s![pos..pos + len]));
            pos += len;
        }
        Ok(())
    }

    // ---- Helper methods ----

    fn block_by_name(&self, name: &str) -> RegArchResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RegArchError::UnknownParamName { name: name.to_string() })
    }

    fn block_ref(&self, block: usize) -> RegArchResult<&ParamBlock> {
        let n_blocks = self.blocks.len();
        self.blocks.get(block).ok_or(RegArchError::BlockIndexOutOfRange { block, n_blocks })
    }

    fn block_mut(&mut self, block: usize) -> RegArchResult<&mut ParamBlock> {
        let n_blocks = self.blocks.len();
        self.blocks.get_mut(block).ok_or(RegArchError::BlockIndexOutOfRange { block, n_blocks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Index/name access agreement, block reallocation rules and the flat-vector
    // round trip with an offset.
    // -------------------------------------------------------------------------

    fn garch_like() -> ParamBlocks {
        ParamBlocks::new().with_scalar("const", 0.1).with_vector("arch", 2).with_vector("garch", 1)
    }

    #[test]
    // Purpose
    // -------
    // Index and name access address the same slot.
    //
    // Given
    // -----
    // - Blocks const(1), arch(2), garch(1).
    //
    // Expect
    // ------
    // - Setting by name is visible by index and vice versa; names are
    //   case-insensitive.
    fn index_and_name_access_agree() {
        let mut p = garch_like();
        p.set_value_name(0.25, "ARCH", 1).unwrap();
        assert_eq!(p.get_value_index(1, 1).unwrap(), 0.25);
        p.set_value_index(0.6, 0, 2).unwrap();
        assert_eq!(p.get_value_name("garch", 0).unwrap(), 0.6);
        assert_eq!(p.n_param(), 4);
        assert_eq!(p.block_offset(2), 3);
    }

    #[test]
    // Purpose
    // -------
    // Scalar labels carry no index; vector labels are 1-based.
    fn labels_expand_blocks() {
        let p = garch_like();
        assert_eq!(
            p.labels("Garch"),
            vec!["Garch.const", "Garch.arch[1]", "Garch.arch[2]", "Garch.garch[1]"]
        );
        assert!(ParamBlocks::new().with_vector("ar", 0).labels("Ar").is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Out-of-range accesses are reported, never panicking.
    fn out_of_range_access_reports_errors() {
        let p = garch_like();
        assert!(matches!(
            p.get_value_index(0, 7),
            Err(RegArchError::BlockIndexOutOfRange { block: 7, n_blocks: 3 })
        ));
        assert!(matches!(
            p.get_value_index(5, 1),
            Err(RegArchError::ParamIndexOutOfRange { index: 5, len: 2 })
        ));
        assert!(matches!(p.get_value_name("beta", 0), Err(RegArchError::UnknownParamName { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Scalar blocks refuse reallocation; vector blocks resize and zero-fill.
    fn realloc_respects_block_kind() {
        let mut p = garch_like();
        assert!(p.realloc_block(3, 0).is_err());
        p.realloc_block(3, 1).unwrap();
        assert_eq!(p.n_param(), 5);
        assert_eq!(p.get_vector_index(1).unwrap(), array![0.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Writing to and reading from a flat vector at an offset is lossless.
    //
    // Given
    // -----
    // - A length-6 destination and offset 2.
    //
    // Expect
    // ------
    // - Slots 2..6 hold the blocks in order; reading a modified vector back
    //   updates every block.
    fn flat_vector_round_trip_with_offset() {
        let mut p = garch_like();
        p.set_vector_name(&array![0.05, 0.1], "arch").unwrap();
        p.set_value_index(0.8, 0, 2).unwrap();
        let mut dest = Array1::zeros(6);
        p.to_vector(&mut dest, 2).unwrap();
        assert_eq!(dest, array![0.0, 0.0, 0.1, 0.05, 0.1, 0.8]);

        let src = array![9.0, 9.0, 0.2, 0.3, 0.4, 0.5];
        p.from_vector(&src, 2).unwrap();
        assert_eq!(p.get_vector_index(1).unwrap(), array![0.3, 0.4]);
        assert!(p.to_vector(&mut Array1::zeros(3), 1).is_err());
    }
}
