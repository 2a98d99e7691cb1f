use crate::error::Result;

/// Semantic name for a piece of text on a profile page. Slot numbers are
/// 1-based and follow display order. How a locator maps onto the markup is
/// the business of the `FragmentSource` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Name,
    Title,
    Location,
    About,

    ContactHeading(usize),
    ContactLink(usize),
    ContactText(usize),
    ContactListItem(usize),

    Institute(usize),
    Qualification(usize),

    // Single role at a company.
    Role(usize),
    Company(usize),
    Period(usize),
    Skills(usize),

    // Employer block with several roles nested under it.
    GroupCompany(usize),
    GroupPeriod(usize),
    NestedSkills { slot: usize, sub: usize },
}

/// The page currently open in the session, queried by locator.
pub trait FragmentSource {
    /// Replaces the current page with `target`.
    fn navigate(&mut self, target: &str) -> Result<()>;

    /// `Ok(None)` means the fragment is simply not on the page. `Err` is
    /// reserved for failures of the session itself.
    fn text(&mut self, locator: Locator) -> Result<Option<String>>;
}

/// Walks slots `start, start + 1, ...` until `resolve` reports nothing at a
/// slot. An error is yielded once and ends the walk.
pub fn positional<T, F>(start: usize, mut resolve: F) -> impl Iterator<Item = Result<T>>
where
    F: FnMut(usize) -> Result<Option<T>>,
{
    let mut slot = start;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match resolve(slot) {
            Ok(Some(value)) => {
                slot += 1;
                Some(Ok(value))
            }
            Ok(None) => {
                done = true;
                None
            }
            Err(e) => {
                done = true;
                Some(Err(e))
            }
        }
    })
}
