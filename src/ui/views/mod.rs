mod cards;
mod chart;
mod chat;
mod logs;
mod table;

pub use cards::draw_summary_cards;
pub use chart::draw_chart;
pub use chat::draw_chat;
pub use logs::draw_logs;
pub use table::draw_table;
