//! Control-flow node handlers (§4.5).

pub mod condition;
pub mod conditions;
pub mod continue_on_fail;
pub mod expression;
pub mod fallback;
pub mod loop_node;
pub mod math;
pub mod merge;
pub mod retry;
pub mod set_variable;
pub mod switch;
pub mod throw_error;
pub mod timeout;
pub mod try_catch;
pub mod wait;

pub use condition::ConditionHandler;
pub use continue_on_fail::ContinueOnFailHandler;
pub use expression::ExpressionHandler;
pub use fallback::FallbackHandler;
pub use loop_node::LoopHandler;
pub use math::MathHandler;
pub use merge::MergeHandler;
pub use retry::RetryHandler;
pub use set_variable::SetVariableHandler;
pub use switch::SwitchHandler;
pub use throw_error::ThrowErrorHandler;
pub use timeout::TimeoutHandler;
pub use try_catch::TryCatchHandler;
pub use wait::WaitHandler;
