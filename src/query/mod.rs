pub mod boolean;
pub mod phrase;
pub mod wildcard;

pub use boolean::BooleanQueryEvaluator;
pub use phrase::{has_sequential_positions, PhraseQueryEvaluator, PhraseStrategy};
pub use wildcard::{WildcardPattern, WildcardQueryEvaluator, WildcardStrategy};
