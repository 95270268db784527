pub mod color;
pub mod diagnostics;
pub mod logging;
#[cfg(test)]
pub mod test_utils;
pub mod url;
