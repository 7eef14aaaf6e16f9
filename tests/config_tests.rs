use chrono::NaiveDate;
use std::io::Write;
use tally::cache::{CacheKey, QueryKey};
use tally::config::Config;
use tally::range::{DateRange, RangePreset};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(contents.as_bytes()).unwrap();
  file
}

#[test]
fn load_from_explicit_path() {
  let file = write_config(
    "api:\n  url: http://localhost:3000/api/v1\ndefault_range: this-year\n",
  );

  let config = Config::load(Some(file.path())).unwrap();

  assert_eq!(config.api.url, "http://localhost:3000/api/v1");
  assert_eq!(config.default_range, RangePreset::ThisYear);
  assert_eq!(config.resource, "items");
}

#[test]
fn malformed_file_names_the_path() {
  let file = write_config("api: [not, a, map]\n");

  let err = Config::load(Some(file.path())).unwrap_err();

  assert!(err
    .to_string()
    .contains(&file.path().display().to_string()));
}

#[test]
fn configured_preset_resolves_to_cache_key() {
  let file = write_config("api:\n  url: http://localhost\ndefault_range: last-month\n");
  let config = Config::load(Some(file.path())).unwrap();

  let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
  let range = config.default_range.resolve(today);
  let key = CacheKey::new(config.resource.clone(), range);

  let expected = DateRange::new(
    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
  )
  .unwrap();
  assert_eq!(key, CacheKey::new("items", expected));
  assert_eq!(key.description(), "items 2024-02-01..2024-02-29");
}
