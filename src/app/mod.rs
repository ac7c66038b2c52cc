pub mod ports;
pub mod acquisition_use_case;
pub mod directory_use_case;
pub mod generation_use_case;

#[cfg(test)]
pub(crate) mod test_support;
