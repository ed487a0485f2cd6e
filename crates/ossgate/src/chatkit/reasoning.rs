/// Whether a reasoning entry carries no information (blank or a bare "done" recap)
pub fn is_trivial_reasoning(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.is_empty() || t == "done"
}
