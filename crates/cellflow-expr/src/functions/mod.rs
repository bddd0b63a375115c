//! Built-in expression functions

pub mod logical;
pub mod math;
pub mod text;

use crate::error::ExprResult;
use crate::evaluator::EvaluationContext;
use ahash::AHashMap;
use cellflow_core::Value;

/// Function implementation signature
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> ExprResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn def(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation,
        });
    }

    fn register_math_functions(&mut self) {
        self.def("SUM", 1, None, math::fn_sum);
        self.def("AVERAGE", 1, None, math::fn_average);
        self.def("MIN", 1, None, math::fn_min);
        self.def("MAX", 1, None, math::fn_max);
        self.def("COUNT", 1, None, math::fn_count);
        self.def("ABS", 1, Some(1), math::fn_abs);
        self.def("ROUND", 1, Some(2), math::fn_round);
        self.def("SQRT", 1, Some(1), math::fn_sqrt);
        self.def("POWER", 2, Some(2), math::fn_power);
    }

    fn register_logical_functions(&mut self) {
        self.def("IF", 2, Some(3), logical::fn_if);
        self.def("AND", 1, None, logical::fn_and);
        self.def("OR", 1, None, logical::fn_or);
        self.def("NOT", 1, Some(1), logical::fn_not);
    }

    fn register_text_functions(&mut self) {
        self.def("CONCAT", 1, None, text::fn_concat);
        self.def("LEN", 1, Some(1), text::fn_len);
        self.def("UPPER", 1, Some(1), text::fn_upper);
        self.def("LOWER", 1, Some(1), text::fn_lower);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Visit every number in the arguments, descending into lists
///
/// Non-numeric scalars are skipped, matching the aggregate functions'
/// "ignore text" behavior.
pub(crate) fn for_each_number(args: &[Value], f: &mut impl FnMut(f64)) {
    for arg in args {
        match arg {
            Value::Number(n) => f(*n),
            Value::List(items) => for_each_number(items, f),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("sum").is_some());
        assert!(registry.get("Sum").is_some());
        assert!(registry.get("NOPE").is_none());
        assert_eq!(registry.len(), 17);
    }
}
