use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProblemError {
    #[error("{collection} index {index} out of range (len {len})")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
}

pub(crate) fn lookup<'a, T>(
    items: &'a [T],
    collection: &'static str,
    index: usize,
) -> Result<&'a T, ProblemError> {
    items.get(index).ok_or(ProblemError::OutOfRange {
        collection,
        index,
        len: items.len(),
    })
}
