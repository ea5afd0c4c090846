// File I/O operations: the loader side of reconciliation and exception export

pub mod csv;
pub mod xlsx;

/// File name an exception set is exported under, e.g. `exceptions_MTN.xlsx`.
pub fn exception_file_name(carrier: &str, extension: &str) -> String {
    format!("exceptions_{carrier}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_file_name() {
        assert_eq!(exception_file_name("MTN", "xlsx"), "exceptions_MTN.xlsx");
        assert_eq!(exception_file_name("OCM", "csv"), "exceptions_OCM.csv");
    }
}
