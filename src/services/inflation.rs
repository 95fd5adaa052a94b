// Inflation adjustment using the US CPI-U annual average series (1982-84 = 100)
// Source: Bureau of Labor Statistics, series CUUR0000SA0

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::InflationError;

/// Embedded CPI-U annual averages. Extend or replace with `[inflation] cpi_table`.
const CPI_U_ANNUAL: &[(i32, f64)] = &[
    (1913, 9.9),
    (1914, 10.0),
    (1915, 10.1),
    (1916, 10.9),
    (1917, 12.8),
    (1918, 15.1),
    (1919, 17.3),
    (1920, 20.0),
    (1921, 17.9),
    (1922, 16.8),
    (1923, 17.1),
    (1924, 17.1),
    (1925, 17.5),
    (1926, 17.7),
    (1927, 17.4),
    (1928, 17.1),
    (1929, 17.1),
    (1930, 16.7),
    (1931, 15.2),
    (1932, 13.7),
    (1933, 13.0),
    (1934, 13.4),
    (1935, 13.7),
    (1936, 13.9),
    (1937, 14.4),
    (1938, 14.1),
    (1939, 13.9),
    (1940, 14.0),
    (1941, 14.7),
    (1942, 16.3),
    (1943, 17.3),
    (1944, 17.6),
    (1945, 18.0),
    (1946, 19.5),
    (1947, 22.3),
    (1948, 24.1),
    (1949, 23.8),
    (1950, 24.1),
    (1951, 26.0),
    (1952, 26.5),
    (1953, 26.7),
    (1954, 26.9),
    (1955, 26.8),
    (1956, 27.2),
    (1957, 28.1),
    (1958, 28.9),
    (1959, 29.1),
    (1960, 29.6),
    (1961, 29.9),
    (1962, 30.2),
    (1963, 30.6),
    (1964, 31.0),
    (1965, 31.5),
    (1966, 32.4),
    (1967, 33.4),
    (1968, 34.8),
    (1969, 36.7),
    (1970, 38.8),
    (1971, 40.5),
    (1972, 41.8),
    (1973, 44.4),
    (1974, 49.3),
    (1975, 53.8),
    (1976, 56.9),
    (1977, 60.6),
    (1978, 65.2),
    (1979, 72.6),
    (1980, 82.4),
    (1981, 90.9),
    (1982, 96.5),
    (1983, 99.6),
    (1984, 103.9),
    (1985, 107.6),
    (1986, 109.6),
    (1987, 113.6),
    (1988, 118.3),
    (1989, 124.0),
    (1990, 130.7),
    (1991, 136.2),
    (1992, 140.3),
    (1993, 144.5),
    (1994, 148.2),
    (1995, 152.4),
    (1996, 156.9),
    (1997, 160.5),
    (1998, 163.0),
    (1999, 166.6),
    (2000, 172.2),
    (2001, 177.1),
    (2002, 179.9),
    (2003, 184.0),
    (2004, 188.9),
    (2005, 195.3),
    (2006, 201.6),
    (2007, 207.342),
    (2008, 215.303),
    (2009, 214.537),
    (2010, 218.056),
    (2011, 224.939),
    (2012, 229.594),
    (2013, 232.957),
    (2014, 236.736),
    (2015, 237.017),
    (2016, 240.007),
    (2017, 245.120),
    (2018, 251.107),
    (2019, 255.657),
    (2020, 258.811),
    (2021, 270.970),
    (2022, 292.655),
    (2023, 304.702),
    (2024, 313.689),
];

/// Annual price index series used to express past box office in present terms
#[derive(Debug, Clone)]
pub struct PriceIndex {
    values: BTreeMap<i32, f64>,
}

impl PriceIndex {
    /// The embedded CPI-U table
    pub fn embedded() -> Self {
        Self {
            values: CPI_U_ANNUAL.iter().copied().collect(),
        }
    }

    /// Build from `(year, index)` pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, f64)>) -> Result<Self, InflationError> {
        let values: BTreeMap<i32, f64> = pairs.into_iter().collect();
        if values.is_empty() {
            return Err(InflationError::EmptyTable);
        }
        Ok(Self { values })
    }

    /// Parse a `year,index` CSV table. A header row, blank lines and `#` comments are skipped.
    pub fn parse_csv(contents: &str) -> Result<Self, InflationError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let mut pairs = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| InflationError::MalformedTable {
                line: e.position().map_or(0, |p| p.line() as usize),
                content: e.to_string(),
            })?;

            let malformed = || InflationError::MalformedTable {
                line: record.position().map_or(i + 1, |p| p.line() as usize),
                content: record.iter().collect::<Vec<_>>().join(","),
            };

            // Header row
            if i == 0 && record.get(0).is_some_and(|y| y.parse::<i32>().is_err()) {
                continue;
            }

            if record.len() != 2 {
                return Err(malformed());
            }
            let (year, value): (i32, f64) = record.deserialize(None).map_err(|_| malformed())?;
            if value <= 0.0 || !value.is_finite() {
                return Err(malformed());
            }
            pairs.push((year, value));
        }

        Self::from_pairs(pairs)
    }

    /// Load a CSV table from disk, falling back to the embedded table on read errors
    pub fn load(path: Option<&Path>) -> Result<Self, InflationError> {
        let Some(path) = path else {
            return Ok(Self::embedded());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let index = Self::parse_csv(&contents)?;
                tracing::info!(
                    "Loaded price index {}-{} from {}",
                    index.first_year(),
                    index.latest_year(),
                    path.display()
                );
                Ok(index)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read price index {}: {}. Using embedded CPI-U table.",
                    path.display(),
                    e
                );
                Ok(Self::embedded())
            }
        }
    }

    pub fn first_year(&self) -> i32 {
        self.values.keys().next().copied().unwrap_or_default()
    }

    /// The year values are adjusted to
    pub fn latest_year(&self) -> i32 {
        self.values.keys().next_back().copied().unwrap_or_default()
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    /// Express `value` from `release_year` in present terms.
    ///
    /// Releases from `current_year` or later (including future-dated data) are
    /// returned unchanged. Past years without an index entry are an error.
    pub fn adjust(
        &self,
        value: f64,
        release_year: i32,
        current_year: i32,
    ) -> Result<f64, InflationError> {
        let year = release_year.min(current_year);
        if year >= current_year {
            return Ok(value);
        }

        let target = self.latest_year();
        if year >= target {
            // Already in the newest terms the table can express
            return Ok(value);
        }

        let from = self
            .get(year)
            .ok_or(InflationError::IndexUnavailable(year))?;
        let to = self
            .get(target)
            .ok_or(InflationError::IndexUnavailable(target))?;

        Ok(value * to / from)
    }
}

impl Default for PriceIndex {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Parse a release year from scraped text such as "1999" or "1999-07-02"
pub fn parse_release_year(text: &str) -> Result<i32, InflationError> {
    let trimmed = text.trim();
    trimmed
        .get(..4)
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .filter(|_| {
            trimmed.len() == 4 || !trimmed[4..].starts_with(|c: char| c.is_ascii_digit())
        })
        .and_then(|y| y.parse().ok())
        .ok_or_else(|| InflationError::InvalidYear(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table() {
        let index = PriceIndex::embedded();
        assert_eq!(index.first_year(), 1913);
        assert_eq!(index.latest_year(), 2024);
        assert_eq!(index.get(1999), Some(166.6));
    }

    #[test]
    fn test_adjust_past_year() {
        let index = PriceIndex::from_pairs([(2000, 100.0), (2010, 150.0), (2020, 200.0)]).unwrap();
        let adjusted = index.adjust(1_000.0, 2000, 2026).unwrap();
        assert!((adjusted - 2_000.0).abs() < 1e-9);

        let adjusted = index.adjust(1_000.0, 2010, 2026).unwrap();
        assert!((adjusted - 1_333.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_current_and_future_years_unchanged() {
        let index = PriceIndex::embedded();
        assert_eq!(index.adjust(500.0, 2026, 2026).unwrap(), 500.0);
        assert_eq!(index.adjust(500.0, 2031, 2026).unwrap(), 500.0);
    }

    #[test]
    fn test_missing_year_is_surfaced() {
        let index = PriceIndex::from_pairs([(2000, 100.0), (2020, 200.0)]).unwrap();
        assert_eq!(
            index.adjust(1.0, 1990, 2026),
            Err(InflationError::IndexUnavailable(1990))
        );
        assert_eq!(
            index.adjust(1.0, 2010, 2026),
            Err(InflationError::IndexUnavailable(2010))
        );
    }

    #[test]
    fn test_years_after_table_end_are_not_adjusted() {
        let index = PriceIndex::from_pairs([(2000, 100.0), (2020, 200.0)]).unwrap();
        assert_eq!(index.adjust(10.0, 2020, 2026).unwrap(), 10.0);
        assert_eq!(index.adjust(10.0, 2023, 2026).unwrap(), 10.0);
    }

    #[test]
    fn test_parse_release_year() {
        assert_eq!(parse_release_year("1999").unwrap(), 1999);
        assert_eq!(parse_release_year(" 2004-07-02").unwrap(), 2004);
        assert!(parse_release_year("").is_err());
        assert!(parse_release_year("N/A").is_err());
        assert!(parse_release_year("19999").is_err());
    }

    #[test]
    fn test_unparseable_year() {
        assert_eq!(
            parse_release_year("soon"),
            Err(InflationError::InvalidYear("soon".to_string()))
        );
    }

    #[test]
    fn test_parse_csv() {
        let csv = "year,cpi\n2000,100\n\n2010, 150.5\n";
        let index = PriceIndex::parse_csv(csv).unwrap();
        assert_eq!(index.get(2010), Some(150.5));
        assert_eq!(index.latest_year(), 2010);

        assert!(matches!(
            PriceIndex::parse_csv("2000,100\n2001;101\n"),
            Err(InflationError::MalformedTable { line: 2, .. })
        ));
        assert_eq!(
            PriceIndex::parse_csv("year,cpi\n").unwrap_err(),
            InflationError::EmptyTable
        );
    }

    #[test]
    fn test_parse_csv_comments_and_line_numbers() {
        let csv = "# CPI-U annual averages\nyear,cpi\n1999,166.6\n# revised\n2000,172.2\n";
        let index = PriceIndex::parse_csv(csv).unwrap();
        assert_eq!(index.first_year(), 1999);
        assert_eq!(index.get(2000), Some(172.2));

        match PriceIndex::parse_csv("year,cpi\n2000,100\n2001,abc\n") {
            Err(InflationError::MalformedTable { line, content }) => {
                assert_eq!(line, 3);
                assert_eq!(content, "2001,abc");
            }
            other => panic!("expected a malformed table, got {:?}", other),
        }

        assert!(matches!(
            PriceIndex::parse_csv("2000,100\n2001,-3\n"),
            Err(InflationError::MalformedTable { line: 2, .. })
        ));
        assert!(matches!(
            PriceIndex::parse_csv("2000,100,7\n"),
            Err(InflationError::MalformedTable { line: 1, .. })
        ));
    }
}
