/// Actions an observer can take during coordinate descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the search and return the current estimate.
    StopEarly,
}
