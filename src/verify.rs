//! Comparison of execution results against declarations and each other.
//!
//! Mismatches are reported, not raised: every declared check runs, failures
//! accumulate, and the caller turns the verdict into an exit status.

use crate::diff::byte_diff;
use crate::memory::ExecResult;

/// Check each declared stack against the decoded cell contents.
///
/// Only the provided entries are checked (the list may be shorter than the
/// cell count). Returns whether every checked cell matched.
pub fn check_stacks(result: &ExecResult, expected: &[Vec<u16>]) -> bool {
    let mut ok = true;
    for (i, want) in expected.iter().enumerate() {
        let Some(cell) = result.cells.get(i) else {
            println!("[STACK {}]\tExpected {:?} but the result has no cell {}", i, want, i);
            ok = false;
            continue;
        };
        let got = cell.stack();
        if got != *want {
            println!("[STACK {}]\tExpected {:?} != Actual {:?}", i, want, got);
            ok = false;
        }
    }
    ok
}

/// Byte-exact comparison of two executions, cell by cell.
///
/// Cycle counts are not compared; the hardware cannot report them. Any byte
/// difference anywhere fails the verdict, but every cell is still diffed.
pub fn compare_cells(reference: &ExecResult, actual: &ExecResult) -> bool {
    let mut ok = true;
    if reference.cells.len() != actual.cells.len() {
        println!(
            "[CELLS]\tExpected {} cells, got {}",
            reference.cells.len(),
            actual.cells.len()
        );
        ok = false;
    }
    for (i, (want, got)) in reference.cells.iter().zip(actual.cells.iter()).enumerate() {
        if want != got {
            let diff = byte_diff(got.as_bytes(), want.as_bytes());
            println!("[CELL {}]\t{}", i, diff.text);
            ok = false;
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CELL_BYTES;
    use crate::memory::MemoryCell;

    fn result_with_cells(cells: Vec<MemoryCell>) -> ExecResult {
        let size = cells.len() * 2;
        ExecResult {
            cells,
            cycles: 0,
            size,
        }
    }

    fn cell_with_stack(words: &[u16]) -> MemoryCell {
        let mut bytes = [0u8; CELL_BYTES];
        let sp = 256 - words.len();
        bytes[0] = sp as u8; // 256 wraps back to the raw 0
        for (i, w) in words.iter().enumerate() {
            let off = (sp + i) * 2;
            bytes[off..off + 2].copy_from_slice(&w.to_be_bytes());
        }
        MemoryCell::new(bytes)
    }

    #[test]
    fn empty_expectation_matches_empty_stack() {
        let res = result_with_cells(vec![cell_with_stack(&[])]);
        assert!(check_stacks(&res, &[vec![]]));
    }

    #[test]
    fn stack_mismatch_fails_without_aborting_later_cells() {
        let res = result_with_cells(vec![cell_with_stack(&[1]), cell_with_stack(&[2, 3])]);
        assert!(!check_stacks(&res, &[vec![9], vec![2, 3]]));
        assert!(check_stacks(&res, &[vec![1], vec![2, 3]]));
    }

    #[test]
    fn only_provided_stacks_are_checked() {
        let res = result_with_cells(vec![cell_with_stack(&[1]), cell_with_stack(&[7])]);
        assert!(check_stacks(&res, &[vec![1]]));
    }

    #[test]
    fn more_expectations_than_cells_fails() {
        let res = result_with_cells(vec![cell_with_stack(&[1])]);
        assert!(!check_stacks(&res, &[vec![1], vec![2]]));
    }

    #[test]
    fn identical_cells_match_regardless_of_cycles() {
        let a = ExecResult {
            cells: vec![cell_with_stack(&[4, 5])],
            cycles: 1234,
            size: 6,
        };
        let b = ExecResult {
            cells: vec![cell_with_stack(&[4, 5])],
            cycles: 0,
            size: 6,
        };
        assert!(compare_cells(&a, &b));
    }

    #[test]
    fn any_byte_difference_fails() {
        let mut bytes = [0u8; CELL_BYTES];
        bytes[0] = 1;
        let a = result_with_cells(vec![MemoryCell::new(bytes)]);
        bytes[300] = 0xff;
        let b = result_with_cells(vec![MemoryCell::new(bytes)]);
        assert!(!compare_cells(&a, &b));
    }

    #[test]
    fn differing_cell_counts_fail() {
        let a = result_with_cells(vec![cell_with_stack(&[])]);
        let b = result_with_cells(vec![cell_with_stack(&[]), cell_with_stack(&[])]);
        assert!(!compare_cells(&a, &b));
    }
}
