/// Split a line on commas, trimming every field. No quoting or escaping is
/// supported; quote characters stay part of the field.
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}
