//! Built-in type method tables (component C2, spec §4.2). Each submodule
//! exposes a `call` function dispatched from `object::call_method`.

pub mod array;
pub mod enumerable;
pub mod hash;
pub mod number;
pub mod proc_;
pub mod range;
pub mod regexp;
pub mod string;
pub mod symbol;
pub mod time;

use crate::error::{argument_count_error, SlimResult};
use crate::value::Value;

/// spec §4.1/§4.2: shared argument-count guard used by every type module.
pub(crate) fn want_args(method: &str, args: &[Value], min: usize, max: usize) -> SlimResult<()> {
    if args.len() < min || args.len() > max {
        return Err(argument_count_error(format!(
            "wrong number of arguments to `{method}' (given {}, expected {}{})",
            args.len(),
            min,
            if max == min {
                String::new()
            } else if max == usize::MAX {
                "+".to_owned()
            } else {
                format!("..{max}")
            }
        )));
    }
    Ok(())
}
