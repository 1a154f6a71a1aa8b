//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn has_section(&self, section: &str) -> bool;
    /// Keys of `section` in sorted order; empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;
}
