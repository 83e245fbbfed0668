//! Window layout - where the menu bar, toolbar, panes and dialogs go
//!
//! Computed from the window size and font metrics; shared by the renderer
//! and mouse hit testing so both always agree.

use crate::syntax::LanguageTag;

/// Width of line number gutter in characters (e.g., " 123 ")
pub const LINE_NUMBER_GUTTER_CHARS: usize = 5;
/// Padding after line numbers, before the gutter border (pixels)
pub const GUTTER_PADDING_PX: f32 = 4.0;
/// Padding after the gutter border, before text content (pixels)
pub const TEXT_AREA_PADDING_PX: f32 = 8.0;
/// Padding inside bars and buttons (pixels)
pub const BAR_PADDING_PX: f32 = 6.0;
/// Share of the content height given to the output pane
pub const OUTPUT_FRACTION: f32 = 0.35;
/// The output pane never gets fewer lines than this
pub const MIN_OUTPUT_LINES: usize = 3;

/// X offset where text begins inside the editor pane
#[inline]
pub fn text_start_x(char_width: f32) -> f32 {
    gutter_border_x(char_width) + 1.0 + TEXT_AREA_PADDING_PX
}

/// X offset of the gutter border inside the editor pane
#[inline]
pub fn gutter_border_x(char_width: f32) -> f32 {
    char_width * LINE_NUMBER_GUTTER_CHARS as f32 + GUTTER_PADDING_PX
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Items on the toolbar, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarItem {
    Run,
    Stop,
    Save,
    LanguageSelector,
    LanguageLabel,
    Info,
    Debug,
}

impl ToolbarItem {
    pub const ALL: &'static [ToolbarItem] = &[
        ToolbarItem::Run,
        ToolbarItem::Stop,
        ToolbarItem::Save,
        ToolbarItem::LanguageSelector,
        ToolbarItem::LanguageLabel,
        ToolbarItem::Info,
        ToolbarItem::Debug,
    ];

    /// Text shown on the item
    pub fn text(self, language: LanguageTag) -> String {
        match self {
            ToolbarItem::Run => "Run".to_string(),
            ToolbarItem::Stop => "Stop".to_string(),
            ToolbarItem::Save => "Save".to_string(),
            ToolbarItem::LanguageSelector => format!("{} \u{25BE}", language.display_name()),
            ToolbarItem::LanguageLabel => language.label(),
            ToolbarItem::Info => "Info".to_string(),
            ToolbarItem::Debug => "Debug".to_string(),
        }
    }

    /// Whether clicking the item does anything
    pub fn is_clickable(self) -> bool {
        self != ToolbarItem::LanguageLabel
    }
}

/// Which dialog a rect is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogSize {
    /// Info and Debug dialogs
    Large,
    /// Input prompt
    Prompt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub window: Rect,
    pub menu_bar: Rect,
    /// The "Themes" entry of the menu bar
    pub themes_menu: Rect,
    pub toolbar: Rect,
    pub toolbar_items: Vec<(ToolbarItem, Rect)>,
    pub editor: Rect,
    pub output: Rect,
    pub status_bar: Rect,
    pub line_height: f32,
    pub char_width: f32,
}

impl Layout {
    pub fn compute(
        window_size: (u32, u32),
        line_height: usize,
        char_width: f32,
        language: LanguageTag,
    ) -> Self {
        let (width, height) = (window_size.0 as f32, window_size.1 as f32);
        let lh = line_height as f32;

        let menu_bar = Rect::new(0.0, 0.0, width, lh + BAR_PADDING_PX);
        let themes_menu = Rect::new(
            0.0,
            0.0,
            "Themes".len() as f32 * char_width + 2.0 * BAR_PADDING_PX,
            menu_bar.height,
        );

        let toolbar = Rect::new(0.0, menu_bar.bottom(), width, lh + 2.0 * BAR_PADDING_PX);
        let mut toolbar_items = Vec::with_capacity(ToolbarItem::ALL.len());
        let mut x = BAR_PADDING_PX;
        for &item in ToolbarItem::ALL {
            let text_width = item.text(language).chars().count() as f32 * char_width;
            let item_width = text_width + 2.0 * BAR_PADDING_PX;
            toolbar_items.push((
                item,
                Rect::new(x, toolbar.y + BAR_PADDING_PX / 2.0, item_width, lh + BAR_PADDING_PX),
            ));
            x += item_width + BAR_PADDING_PX;
        }

        let status_bar = Rect::new(0.0, (height - lh).max(toolbar.bottom()), width, lh);
        let content_top = toolbar.bottom();
        let content_height = (status_bar.y - content_top).max(0.0);
        let output_height = (content_height * OUTPUT_FRACTION)
            .max(MIN_OUTPUT_LINES as f32 * lh + BAR_PADDING_PX)
            .min(content_height);
        let editor = Rect::new(0.0, content_top, width, content_height - output_height);
        let output = Rect::new(0.0, editor.bottom(), width, output_height);

        Self {
            window: Rect::new(0.0, 0.0, width, height),
            menu_bar,
            themes_menu,
            toolbar,
            toolbar_items,
            editor,
            output,
            status_bar,
            line_height: lh,
            char_width,
        }
    }

    /// Lines and columns of text that fit in the editor pane
    pub fn editor_text_size(&self) -> (usize, usize) {
        let lines = (self.editor.height / self.line_height).floor().max(0.0) as usize;
        let columns = ((self.editor.width - text_start_x(self.char_width)) / self.char_width)
            .floor()
            .max(0.0) as usize;
        (lines, columns)
    }

    /// Lines of text that fit in the output pane
    pub fn output_visible_lines(&self) -> usize {
        ((self.output.height - BAR_PADDING_PX) / self.line_height)
            .floor()
            .max(0.0) as usize
    }

    pub fn toolbar_item(&self, item: ToolbarItem) -> Rect {
        self.toolbar_items
            .iter()
            .find(|(i, _)| *i == item)
            .map(|(_, rect)| *rect)
            .unwrap_or_default()
    }

    pub fn toolbar_item_at(&self, x: f32, y: f32) -> Option<ToolbarItem> {
        self.toolbar_items
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(item, _)| *item)
    }

    /// Rects of dropdown entries hanging below `anchor`
    pub fn menu_entries(&self, anchor: Rect, labels: &[&str]) -> Vec<Rect> {
        let widest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = anchor
            .width
            .max(widest as f32 * self.char_width + 2.0 * BAR_PADDING_PX);
        let row = self.line_height + BAR_PADDING_PX;
        (0..labels.len())
            .map(|i| Rect::new(anchor.x, anchor.bottom() + i as f32 * row, width, row))
            .collect()
    }

    /// A dialog centered in the window
    pub fn dialog(&self, size: DialogSize) -> Rect {
        let (want_w, want_h): (f32, f32) = match size {
            DialogSize::Large => (600.0, 400.0),
            DialogSize::Prompt => (420.0, 4.0 * self.line_height + 4.0 * BAR_PADDING_PX),
        };
        let width = want_w.min(self.window.width - 40.0).max(0.0);
        let height = want_h.min(self.window.height - 40.0).max(0.0);
        Rect::new(
            ((self.window.width - width) / 2.0).floor(),
            ((self.window.height - height) / 2.0).floor(),
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::compute((800, 600), 20, 10.0, LanguageTag::Python)
    }

    #[test]
    fn test_regions_stack_without_overlap() {
        let l = layout();
        assert_eq!(l.menu_bar.y, 0.0);
        assert_eq!(l.toolbar.y, l.menu_bar.bottom());
        assert_eq!(l.editor.y, l.toolbar.bottom());
        assert_eq!(l.output.y, l.editor.bottom());
        assert_eq!(l.status_bar.y, l.output.bottom());
        assert_eq!(l.status_bar.bottom(), 600.0);
    }

    #[test]
    fn test_toolbar_items_are_ordered_and_hit_testable() {
        let l = layout();
        let mut last_right = 0.0;
        for (item, rect) in &l.toolbar_items {
            assert!(rect.x >= last_right, "{:?} overlaps its neighbour", item);
            last_right = rect.right();
        }
        let run = l.toolbar_item(ToolbarItem::Run);
        assert_eq!(
            l.toolbar_item_at(run.x + 1.0, run.y + 1.0),
            Some(ToolbarItem::Run)
        );
        assert_eq!(l.toolbar_item_at(799.0, run.y + 1.0), None);
    }

    #[test]
    fn test_language_label_width_follows_language() {
        let python = layout().toolbar_item(ToolbarItem::LanguageLabel);
        let html = Layout::compute((800, 600), 20, 10.0, LanguageTag::Html)
            .toolbar_item(ToolbarItem::LanguageLabel);
        assert_eq!(python.width - html.width, 20.0);
    }

    #[test]
    fn test_dialog_is_centered_and_fits() {
        let l = Layout::compute((500, 300), 20, 10.0, LanguageTag::Python);
        let d = l.dialog(DialogSize::Large);
        assert_eq!(d.width, 460.0);
        assert_eq!(d.height, 260.0);
        assert_eq!(d.x, 20.0);
    }
}
