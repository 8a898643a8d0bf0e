/// Use cases module containing application business logic orchestration
mod analyze_stack;

pub use analyze_stack::AnalyzeStackUseCase;
