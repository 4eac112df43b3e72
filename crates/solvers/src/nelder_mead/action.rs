/// Actions an observer can take during a Nelder–Mead search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the search and return the best vertex measured so far.
    StopEarly,
}
