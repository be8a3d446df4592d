use crate::env::{Binding, BindingKind};
use crate::error::CelResult;
use crate::eval::Machine;
use crate::forms::FORMS;
use crate::primitives::PRIMITIVES;

/// Build the global prefix of the binding stack.
/// Pre-installs the four special forms and every primitive. Globals are
/// pushed once and never removed; locals may shadow them.
pub fn install(m: &mut Machine) -> CelResult<()> {
    for form in &FORMS {
        m.stack.push_global(Binding {
            symbol: form.symbol,
            kind: BindingKind::Transform(form),
        })?;
    }
    for prim in &PRIMITIVES {
        m.stack.push_global(Binding {
            symbol: prim.symbol,
            kind: BindingKind::Native(prim),
        })?;
    }
    tracing::debug!(globals = m.stack.global_count(), "globals installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Limits;
    use crate::env::BindingKind;
    use crate::eval::Machine;
    use crate::symbol::sym;

    #[test]
    fn every_builtin_is_global() {
        let m = Machine::new(Limits::default()).unwrap();
        assert_eq!(m.stack.global_count(), 13);
        assert!(matches!(
            m.stack.lookup(sym::LAMBDA).map(|b| b.kind),
            Some(BindingKind::Transform(_))
        ));
        assert!(matches!(
            m.stack.lookup(sym::NTH).map(|b| b.kind),
            Some(BindingKind::Native(_))
        ));
        assert!(m.stack.lookup(sym::TRUE).is_none());
    }

    #[test]
    fn locals_shadow_globals() {
        let mut m = Machine::new(Limits::default()).unwrap();
        let out = m.eval_str("(bind (add (lambda (a b) (mul a b))) (add 3 4))").unwrap();
        assert_eq!(m.print(out[0]), "12");
        let out = m.eval_str("(add 3 4)").unwrap();
        assert_eq!(m.print(out[0]), "7");
    }

    #[test]
    fn tiny_stack_cannot_hold_globals() {
        let limits = Limits {
            frames: 4,
            ..Limits::default()
        };
        assert!(Machine::new(limits).is_err());
    }
}
