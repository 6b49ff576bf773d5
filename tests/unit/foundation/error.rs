use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        QuadgrabError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        QuadgrabError::invalid_surface("x")
            .to_string()
            .contains("invalid surface:")
    );
    assert!(
        QuadgrabError::no_usable_capture("x")
            .to_string()
            .contains("no usable capture:")
    );
    assert!(
        QuadgrabError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn host_errors_convert() {
    let err: QuadgrabError = HostError::Exhausted("objects".to_string()).into();
    assert!(matches!(err, QuadgrabError::Host(_)));
    assert!(err.to_string().starts_with("host error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = QuadgrabError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
