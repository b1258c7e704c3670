pub mod mock;
pub mod openai;

pub use mock::MockOracle;
pub use openai::OpenAiOracle;
