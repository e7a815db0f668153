pub mod chart_preview;

pub use chart_preview::{ChartPreview, ChartViewer, NoPreview, TerminalPreview};
