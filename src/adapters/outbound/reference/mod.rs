/// Reference data adapters resolving release dates
mod caching_reference_lookup;
mod yaml_reference_table;

pub use caching_reference_lookup::CachingReferenceLookup;
pub use yaml_reference_table::YamlReferenceTable;
