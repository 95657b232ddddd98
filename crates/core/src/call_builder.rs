//! Call builder.
//!
//! Assembles the anonymous PL/SQL block and the positional argument list for
//! a [`ProcedureCall`]. Placeholders are positional (`:1`, `:2`, ...), so the
//! order of [`CallPlan::slots`] is exactly the placeholder order.

use crate::binding::{bind_parameter, BindSlot, OutBinding};
use crate::procedure::ProcedureCall;

/// Call text plus the arguments to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPlan {
    pub sql: String,
    pub slots: Vec<BindSlot>,
}

impl CallPlan {
    /// OUT destinations in slot order.
    pub fn outputs(&self) -> impl Iterator<Item = &OutBinding> {
        self.slots.iter().filter_map(BindSlot::as_out)
    }

    pub fn output_count(&self) -> usize {
        self.outputs().count()
    }
}

/// `:from, :from+1, ..., :to` joined with `", "`. Empty when `from > to`.
fn placeholder_list(from: usize, to: usize) -> String {
    (from..=to)
        .map(|pos| format!(":{pos}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the call text and bind slots.
///
/// - Procedure: `BEGIN NAME(:1, ..., :N); END;`
/// - Function: `BEGIN :1 := NAME(:2, ..., :N+1); END;` where `:1` is the
///   return slot (the first OUT parameter) and the remaining parameters keep
///   their relative order.
pub fn build_call(call: &ProcedureCall) -> CallPlan {
    let name = call.qualified_name();
    let params = call.params();

    match call.return_slot() {
        Some(ret_idx) => {
            let mut slots = Vec::with_capacity(params.len());
            slots.push(bind_parameter(&params[ret_idx], 0));
            for (i, param) in params.iter().enumerate() {
                if i == ret_idx {
                    continue;
                }
                let slot_index = slots.len();
                slots.push(bind_parameter(param, slot_index));
            }

            let sql = format!(
                "BEGIN :1 := {name}({}); END;",
                placeholder_list(2, slots.len())
            );
            CallPlan { sql, slots }
        }
        None => {
            let slots: Vec<BindSlot> = params
                .iter()
                .enumerate()
                .map(|(i, param)| bind_parameter(param, i))
                .collect();

            let sql = format!("BEGIN {name}({}); END;", placeholder_list(1, slots.len()));
            CallPlan { sql, slots }
        }
    }
}
