//! Page arithmetic and the pager buttons drawn under a table.

use serde::Deserialize;

/// Reading direction of the surrounding layout. Pager glyphs mirror in RTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub count: usize,
    pub rows_per_page: usize,
    pub page: usize,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.count.div_ceil(self.rows_per_page.max(1))
    }

    pub fn last_page(&self) -> usize {
        self.page_count().saturating_sub(1)
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        self.page + 1 >= self.page_count()
    }

    /// "11-20 of 25 contacts"
    pub fn range_label(&self, definition: Option<&str>) -> String {
        let rows_per_page = self.rows_per_page.max(1);
        let from = if self.count == 0 {
            0
        } else {
            self.page * rows_per_page + 1
        };
        let to = ((self.page + 1) * rows_per_page).min(self.count);
        match definition {
            Some(noun) => format!("{}-{} of {} {}", from, to, self.count, noun),
            None => format!("{}-{} of {}", from, to, self.count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerButton {
    First,
    Previous,
    Next,
    Last,
}

impl PagerButton {
    pub const ALL: [PagerButton; 4] = [
        PagerButton::First,
        PagerButton::Previous,
        PagerButton::Next,
        PagerButton::Last,
    ];

    const STEPS: [PagerButton; 2] = [PagerButton::Previous, PagerButton::Next];

    /// Buttons to draw; first/last only with `complete_icons`.
    pub fn visible(complete_icons: bool) -> &'static [PagerButton] {
        if complete_icons {
            &Self::ALL
        } else {
            &Self::STEPS
        }
    }

    pub fn disabled(self, pagination: &Pagination) -> bool {
        match self {
            PagerButton::First | PagerButton::Previous => pagination.is_first(),
            PagerButton::Next | PagerButton::Last => pagination.is_last(),
        }
    }

    pub fn target(self, pagination: &Pagination) -> usize {
        match self {
            PagerButton::First => 0,
            PagerButton::Previous => pagination.page.saturating_sub(1),
            PagerButton::Next => pagination.page + 1,
            PagerButton::Last => pagination.last_page(),
        }
    }

    pub fn glyph(self, direction: LayoutDirection) -> &'static str {
        let mirrored = match (self, direction) {
            (button, LayoutDirection::Ltr) => button,
            (PagerButton::First, LayoutDirection::Rtl) => PagerButton::Last,
            (PagerButton::Previous, LayoutDirection::Rtl) => PagerButton::Next,
            (PagerButton::Next, LayoutDirection::Rtl) => PagerButton::Previous,
            (PagerButton::Last, LayoutDirection::Rtl) => PagerButton::First,
        };
        match mirrored {
            PagerButton::First => "«",
            PagerButton::Previous => "‹",
            PagerButton::Next => "›",
            PagerButton::Last => "»",
        }
    }
}
