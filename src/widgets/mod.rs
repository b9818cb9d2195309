pub mod chart;
pub mod controls;
pub mod debug;
pub mod matrix_table;
pub mod radio_block;
