pub mod editor;
pub mod sidebar;
pub mod ui;
