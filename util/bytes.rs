/// Display a byte count in a short human-readable form, e.g. `1.50KB`.
pub struct DisplayBytes(pub u64);

impl std::fmt::Display for DisplayBytes {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let value = self.0;
		if value >= 1_000_000_000 {
			write!(f, "{:.2}GB", value as f64 / 1_000_000_000.0)
		} else if value >= 1_000_000 {
			write!(f, "{:.2}MB", value as f64 / 1_000_000.0)
		} else if value >= 1_000 {
			write!(f, "{:.2}KB", value as f64 / 1_000.0)
		} else {
			write!(f, "{}B", value)
		}
	}
}

#[test]
fn test_display_bytes() {
	assert_eq!(DisplayBytes(42).to_string(), "42B");
	assert_eq!(DisplayBytes(1_500).to_string(), "1.50KB");
	assert_eq!(DisplayBytes(2_250_000).to_string(), "2.25MB");
	assert_eq!(DisplayBytes(3_000_000_000).to_string(), "3.00GB");
}
