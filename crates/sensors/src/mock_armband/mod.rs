pub mod driver;
pub mod mock_data_generator;

pub use driver::MockHub;
