/// Page cursor for one list view.
///
/// Pages are 1-based. The server does not report a total, so "has more" is
/// inferred from a full page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  page: u32,
  page_size: u32,
}

impl Pager {
  pub fn new(page_size: u32) -> Self {
    Self {
      page: 1,
      page_size: page_size.max(1),
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  /// Advance one page. Callers gate this on [`Pager::has_more`].
  pub fn next(&mut self) {
    self.page += 1;
  }

  pub fn prev(&mut self) {
    self.page = self.page.saturating_sub(1).max(1);
  }

  pub fn reset(&mut self) {
    self.page = 1;
  }

  pub fn is_first(&self) -> bool {
    self.page == 1
  }

  /// `(skip, limit)` for the current page
  pub fn window(&self) -> (u32, u32) {
    ((self.page - 1) * self.page_size, self.page_size)
  }

  /// Whether a page holding `len` rows may be followed by another.
  pub fn has_more(&self, len: usize) -> bool {
    len == self.page_size as usize
  }
}

impl Default for Pager {
  fn default() -> Self {
    Self::new(10)
  }
}
