//! Display toggles owned by the host application and the style hints the
//! table state derives from them.

use clap::ValueEnum;
use derive_setters::Setters;

use crate::record::ColorTag;

/// How the rendering layer arranges rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Layout {
    #[default]
    List,
    Stack,
    Grid,
}

impl Layout {
    pub fn next(&self) -> Layout {
        match self {
            Layout::List => Layout::Stack,
            Layout::Stack => Layout::Grid,
            Layout::Grid => Layout::List,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::List => "list",
            Layout::Stack => "stack",
            Layout::Grid => "grid",
        }
    }
}

/// Selection cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectionMode {
    Single,
    Multiple,
}

/// Display flags. The table state reads these but never changes them.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
pub struct DisplayOptions {
    pub colorize: bool,
    pub headerize: bool,
    pub footerize: bool,
    pub layout: Layout,
    /// Field holding the row tint used when colorizing.
    #[setters(into)]
    pub tint_field: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            colorize: false,
            headerize: true,
            footerize: false,
            layout: Layout::default(),
            tint_field: String::from("color"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    #[default]
    None,
    Subtle,
    Strong,
}

/// Presentation hints for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowStyleHint {
    pub background: Emphasis,
    pub border: bool,
    pub tint: Option<ColorTag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_chain_from_default() {
        let opts = DisplayOptions::default()
            .colorize(true)
            .footerize(true)
            .layout(Layout::Grid)
            .tint_field("shade");
        assert!(opts.colorize);
        assert!(opts.headerize);
        assert!(opts.footerize);
        assert_eq!(opts.layout, Layout::Grid);
        assert_eq!(opts.tint_field, "shade");
    }

    #[test]
    fn layouts_cycle() {
        assert_eq!(Layout::List.next().next().next(), Layout::List);
        assert_eq!(Layout::Stack.next(), Layout::Grid);
    }
}
