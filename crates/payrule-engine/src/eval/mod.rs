mod context;
mod evaluator;

pub use context::{
    EmpParamResolver, EvalContext, EvalOptions, GroupMember, GroupResolver, ParamResolver,
    ParamScope, ParamUsage, TaxOutcome, TaxTables, TierMode,
};
pub use evaluator::Evaluator;
