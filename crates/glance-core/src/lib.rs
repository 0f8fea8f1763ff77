pub mod binarize;
pub mod diagnostics;

pub use binarize::{binarize, threshold_from_position};
pub use diagnostics::{DiagnosticSink, FsDiagnosticSink, NullDiagnosticSink};

/// Best-effort text of a caught panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::panic_message;

    #[test]
    fn extracts_str_and_string_payloads() {
        let err = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "boom");

        let err = std::panic::catch_unwind(|| panic!("{}", String::from("owned"))).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "owned");
    }
}
