//! Scroll buffer: the displayed capture plus the viewport offsets into it.
//!
//! Invariant: after every mutation, `offset <= max(0, total_lines - viewport_height)` and
//! `h_offset <= max(0, widest_line - viewport_width)` for the capture on screen.

use crate::core::capture::Capture;
use crate::core::history::CaptureHistory;

/// Scroll position and follow-mode flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub offset: usize,
    pub h_offset: usize,
    /// Reset `offset` to the top whenever a new capture arrives.
    pub follow_latest: bool,
}

/// Line range on screen, for the status bar. `first`/`last` are 1-based and 0 when empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPosition {
    pub first: usize,
    pub last: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    history: CaptureHistory,
    /// Sequence of an older capture kept on screen while newer ones arrive.
    pinned: Option<u64>,
    next_sequence: u64,
    view: ViewState,
    viewport_width: usize,
    viewport_height: usize,
}

impl Default for ScrollBuffer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ScrollBuffer {
    /// Creates an empty buffer keeping `history_depth` previous captures.
    pub fn new(history_depth: usize) -> Self {
        Self {
            history: CaptureHistory::new(history_depth),
            pinned: None,
            next_sequence: 1,
            view: ViewState::default(),
            viewport_width: 0,
            viewport_height: 0,
        }
    }

    pub fn with_viewport(mut self, width: usize, height: usize) -> Self {
        self.set_viewport(width, height);
        self
    }

    pub fn with_follow(mut self, follow_latest: bool) -> Self {
        self.view.follow_latest = follow_latest;
        self
    }

    /// Replaces the held capture and re-clamps the offsets against it.
    pub fn update(&mut self, capture: Capture) {
        let capture = capture.with_sequence(self.next_sequence);
        self.next_sequence += 1;
        self.history.push(capture);

        if let Some(pinned) = self.pinned {
            if self.history.get(pinned).is_none() {
                self.pinned = self.history.oldest().map(Capture::sequence);
            }
            if self.pinned == self.history.latest().map(Capture::sequence) {
                self.pinned = None;
            }
        }

        if self.view.follow_latest && self.pinned.is_none() {
            self.view.offset = 0;
        }
        self.clamp();
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.clamp();
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn viewport_width(&self) -> usize {
        self.viewport_width
    }

    /// Moves the vertical offset by `delta_lines`, stopping at either end.
    pub fn scroll(&mut self, delta_lines: isize) {
        self.view.offset = step(self.view.offset, delta_lines, self.max_offset());
    }

    pub fn scroll_horizontal(&mut self, delta_columns: isize) {
        self.view.h_offset = step(self.view.h_offset, delta_columns, self.max_h_offset());
    }

    pub fn scroll_to_top(&mut self) {
        self.view.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.view.offset = self.max_offset();
    }

    pub fn scroll_to_line_start(&mut self) {
        self.view.h_offset = 0;
    }

    pub fn page_down(&mut self) {
        self.scroll(self.page_size() as isize);
    }

    pub fn page_up(&mut self) {
        self.scroll(-(self.page_size() as isize));
    }

    pub fn half_page_down(&mut self) {
        self.scroll((self.viewport_height / 2).max(1) as isize);
    }

    pub fn half_page_up(&mut self) {
        self.scroll(-((self.viewport_height / 2).max(1) as isize));
    }

    /// Lines currently in view. Shorter than `viewport_height` when the content is.
    pub fn visible_slice(&self, viewport_height: usize) -> &[String] {
        let Some(capture) = self.displayed() else {
            return &[];
        };
        let lines = capture.lines();
        let start = self.view.offset.min(lines.len());
        let end = start.saturating_add(viewport_height).min(lines.len());
        &lines[start..end]
    }

    /// The capture on screen: the pinned history entry, or the latest.
    pub fn displayed(&self) -> Option<&Capture> {
        match self.pinned {
            Some(sequence) => self.history.get(sequence).or_else(|| self.history.latest()),
            None => self.history.latest(),
        }
    }

    pub fn latest(&self) -> Option<&Capture> {
        self.history.latest()
    }

    pub fn total_lines(&self) -> usize {
        self.displayed().map(Capture::line_count).unwrap_or(0)
    }

    pub fn max_offset(&self) -> usize {
        self.total_lines().saturating_sub(self.viewport_height)
    }

    pub fn max_h_offset(&self) -> usize {
        self.displayed()
            .map(Capture::max_width)
            .unwrap_or(0)
            .saturating_sub(self.viewport_width)
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn follow_latest(&self) -> bool {
        self.view.follow_latest
    }

    pub fn set_follow(&mut self, follow_latest: bool) {
        self.view.follow_latest = follow_latest;
    }

    pub fn toggle_follow(&mut self) -> bool {
        self.set_follow(!self.view.follow_latest);
        self.view.follow_latest
    }

    /// Steps one capture back in history. Returns whether the view changed.
    pub fn show_older(&mut self) -> bool {
        let Some(current) = self.displayed().map(Capture::sequence) else {
            return false;
        };
        let Some(older) = self.history.older_than(current).map(Capture::sequence) else {
            return false;
        };
        self.pinned = Some(older);
        self.clamp();
        true
    }

    /// Steps one capture forward in history. Returns whether the view changed.
    pub fn show_newer(&mut self) -> bool {
        let Some(pinned) = self.pinned else {
            return false;
        };
        let newer = self.history.newer_than(pinned).map(Capture::sequence);
        let latest = self.history.latest().map(Capture::sequence);
        self.pinned = if newer == latest { None } else { newer };
        self.clamp();
        true
    }

    pub fn show_latest(&mut self) -> bool {
        if self.pinned.take().is_none() {
            return false;
        }
        self.clamp();
        true
    }

    /// How many captures are newer than the one on screen.
    pub fn history_age(&self) -> usize {
        self.pinned
            .and_then(|sequence| self.history.age_of(sequence))
            .unwrap_or(0)
    }

    pub fn position(&self) -> ScrollPosition {
        let total = self.total_lines();
        let shown = self.visible_slice(self.viewport_height).len();
        if total == 0 || shown == 0 {
            return ScrollPosition {
                first: 0,
                last: 0,
                total,
                percent: 100,
            };
        }
        let first = self.view.offset + 1;
        let last = self.view.offset + shown;
        let percent = ((last * 100) / total).min(100) as u8;
        ScrollPosition {
            first,
            last,
            total,
            percent,
        }
    }

    fn page_size(&self) -> usize {
        self.viewport_height.saturating_sub(1).max(1)
    }

    fn clamp(&mut self) {
        self.view.offset = self.view.offset.min(self.max_offset());
        self.view.h_offset = self.view.h_offset.min(self.max_h_offset());
    }
}

fn step(current: usize, delta: isize, max: usize) -> usize {
    let moved = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    moved.min(max)
}
