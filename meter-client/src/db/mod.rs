pub mod energy_queries;
pub mod line_loss_queries;
pub mod max_min_queries;
