// Unique ID generation for user records.

/// Generate a 21-character nanoid.
pub fn generate_id() -> String {
    nanoid::nanoid!()
}
