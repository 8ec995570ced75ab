mod nodes;
pub(crate) mod path_values;
