use crate::config::NormalizerConfig;
use crate::model::{NormalizedLot, NumberOrText, RawLot, TitleStatus};
use crate::utils::{clean_optional, collapse_whitespace, to_title_case};
use regex::Regex;
use std::sync::LazyLock;

const MAX_ODOMETER: u32 = 1_000_000;

static VIN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[A-HJ-NPR-Z0-9]{17}\b").unwrap());

static YEAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static ODOMETER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:odometer|mileage)\s*:?\s*(\d[\d,]*)|\b(\d[\d,]*)\s*(?:miles|mi)\b").unwrap()
});

static MAKES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Toyota", r"\btoyota\b"),
        ("Lexus", r"\blexus\b"),
        ("Nissan", r"\bnissan\b"),
        ("Ford", r"\bford\b"),
        ("Chevrolet", r"\b(?:chevrolet|chevy)\b"),
        ("GMC", r"\bgmc\b"),
        ("Honda", r"\bhonda\b"),
        ("Acura", r"\bacura\b"),
        ("Dodge", r"\bdodge\b"),
        ("Ram", r"\bram\b"),
        ("Jeep", r"\bjeep\b"),
        ("Mercedes-Benz", r"\bmercedes(?:[\s\-]*benz)?\b"),
        ("Winnebago", r"\bwinnebago\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

static MODELS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "Land Cruiser",
            r"\bland[\s\-]*cruiser\b|\blc\s*-?\d{2,3}\b|\btoyota\s+lc\b",
        ),
        ("LX", r"\blx\s*-?\d{3}\b"),
        ("4Runner", r"\b(?:4|four)[\s\-]*runner\b"),
        ("Tacoma", r"\btacoma\b"),
        ("Tundra", r"\btundra\b"),
        ("T100", r"\bt[\s\-]?100\b"),
        ("Frontier", r"\bfrontier\b"),
        ("Titan", r"\btitan\b"),
        ("Hardbody", r"\bhardbody\b"),
        ("Sprinter", r"\bsprinter\b"),
        ("Transit", r"\btransit\b"),
        ("Travato", r"\btravato\b"),
        ("F-150", r"\bf[\s\-]?150\b"),
        ("Silverado", r"\bsilverado\b"),
        ("Civic", r"\bcivic\b"),
        ("Accord", r"\baccord\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

static TITLE_PATTERNS: LazyLock<Vec<(TitleStatus, Regex)>> = LazyLock::new(|| {
    [
        (TitleStatus::Clean, r"\bclea[nr]\b"),
        (TitleStatus::Rebuilt, r"\b(?:rebuilt|reconstructed)\b"),
        (TitleStatus::Salvage, r"\bsalvaged?\b"),
        (TitleStatus::Flood, r"\bflood(?:ed)?\b|\bwater[\s\-]*damaged?\b"),
        (TitleStatus::Totaled, r"\btotall?ed\b|\btotal[\s\-]*loss\b"),
        (
            TitleStatus::PartsOnly,
            r"\bparts[\s\-]*only\b|\bfor[\s\-]*parts\b|\bscrap\b|\bjunk\b|\bnon[\s\-]*repairable\b",
        ),
    ]
    .into_iter()
    .map(|(status, pattern)| (status, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

static DRIVETRAINS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("4WD", r"\b(?:4x4|4wd)\b"),
        ("AWD", r"\bawd\b"),
        ("2WD", r"\b(?:4x2|2wd)\b"),
        ("FWD", r"\bfwd\b"),
        ("RWD", r"\brwd\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

/// Turns scraper output into comparable lots. Never fails: anything that
/// cannot be resolved from the lot itself is left empty.
#[derive(Debug, Clone)]
pub struct Normalizer {
    min_year: i32,
    max_year: i32,
    validate_check_digit: bool,
}

impl Normalizer {
    /// `reference_year` is the "current" year; plausible years end one after it.
    pub fn new(reference_year: i32, cfg: &NormalizerConfig) -> Self {
        Self {
            min_year: cfg.min_year,
            max_year: reference_year + 1,
            validate_check_digit: cfg.validate_vin_check_digit,
        }
    }

    pub fn normalize(&self, raw: &RawLot) -> NormalizedLot {
        let text = collapse_whitespace(&raw.raw_text);

        let vin = raw
            .vin
            .as_deref()
            .and_then(clean_vin)
            .filter(|v| self.accept_vin(v))
            .or_else(|| self.extract_vin(&text));

        let year = raw
            .year
            .as_ref()
            .and_then(|y| self.year_from_field(y))
            .or_else(|| self.first_year_in(&text));

        let make = match clean_optional(raw.make.as_deref()) {
            Some(make) => Some(canonical_make(&make)),
            None => earliest_alias(&MAKES, &text).map(str::to_string),
        };

        let declared_model = clean_optional(raw.model.as_deref());
        let model_declared = declared_model.is_some();
        let model = match declared_model {
            Some(model) => Some(canonical_model(&model)),
            None => earliest_alias(&MODELS, &text).map(str::to_string),
        };

        let drivetrain = match clean_optional(raw.drivetrain.as_deref()) {
            Some(dt) => Some(
                earliest_alias(&DRIVETRAINS, &dt)
                    .map(str::to_string)
                    .unwrap_or(dt),
            ),
            None => earliest_alias(&DRIVETRAINS, &text).map(str::to_string),
        };

        let odometer = match raw.odometer.as_ref() {
            Some(field) => odometer_from_field(field),
            None => odometer_from_text(&text),
        };

        let condition_notes = clean_optional(raw.condition_notes.as_deref());
        let title_status = title_status_of(&[
            raw.title_status.as_deref().unwrap_or_default(),
            &text,
            condition_notes.as_deref().unwrap_or_default(),
        ]);

        NormalizedLot {
            source: raw.source.trim().to_string(),
            source_lot_id: raw.source_lot_id.trim().to_string(),
            lot_url: clean_optional(raw.lot_url.as_deref()),
            sale_date_utc: raw.sale_date_utc,
            sale_local_time: clean_optional(raw.sale_local_time.as_deref()),
            tz_name: clean_optional(raw.tz_name.as_deref()),
            location_name: clean_optional(raw.location_name.as_deref()),
            location_city: collapse_whitespace(&raw.location_city),
            location_state: raw.location_state.trim().to_uppercase(),
            raw_text: text,
            condition_notes,
            vin,
            year,
            make,
            model,
            model_declared,
            trim: clean_optional(raw.trim.as_deref()),
            title_status,
            drivetrain,
            odometer,
        }
    }

    fn accept_vin(&self, vin: &str) -> bool {
        !self.validate_check_digit || vin_check_digit_valid(vin)
    }

    fn extract_vin(&self, text: &str) -> Option<String> {
        VIN_TOKEN
            .find_iter(text)
            .map(|m| m.as_str().to_uppercase())
            .find(|v| self.accept_vin(v))
    }

    fn in_range(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    fn first_year_in(&self, text: &str) -> Option<i32> {
        YEAR_TOKEN
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<i32>().ok())
            .find(|y| self.in_range(*y))
    }

    fn year_from_field(&self, field: &NumberOrText) -> Option<i32> {
        match field {
            NumberOrText::Number(n) => i32::try_from(*n).ok().filter(|y| self.in_range(*y)),
            NumberOrText::Text(text) => self.first_year_in(text),
        }
    }
}

/// Uppercases and strips separators; `None` unless 17 valid VIN characters remain.
pub fn clean_vin(value: &str) -> Option<String> {
    let vin: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect();
    let valid = vin.len() == 17
        && vin
            .chars()
            .all(|c| c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q')));
    valid.then_some(vin)
}

/// North American VIN check digit (position 9).
pub fn vin_check_digit_valid(vin: &str) -> bool {
    const WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

    let bytes = vin.as_bytes();
    if bytes.len() != 17 {
        return false;
    }

    let mut sum = 0;
    for (byte, weight) in bytes.iter().zip(WEIGHTS) {
        let value = match byte.to_ascii_uppercase() {
            d @ b'0'..=b'9' => u32::from(d - b'0'),
            b'A' | b'J' => 1,
            b'B' | b'K' | b'S' => 2,
            b'C' | b'L' | b'T' => 3,
            b'D' | b'M' | b'U' => 4,
            b'E' | b'N' | b'V' => 5,
            b'F' | b'W' => 6,
            b'G' | b'P' | b'X' => 7,
            b'H' | b'Y' => 8,
            b'R' | b'Z' => 9,
            _ => return false,
        };
        sum += value * weight;
    }

    let expected = match sum % 11 {
        10 => b'X',
        d => b'0' + d as u8,
    };
    bytes[8].to_ascii_uppercase() == expected
}

/// Most severe status mentioned anywhere in `texts`.
pub fn title_status_of(texts: &[&str]) -> TitleStatus {
    texts
        .iter()
        .flat_map(|text| {
            TITLE_PATTERNS
                .iter()
                .filter(move |(_, pattern)| pattern.is_match(text))
                .map(|(status, _)| *status)
        })
        .max()
        .unwrap_or(TitleStatus::Unknown)
}

fn earliest_alias(table: &[(&'static str, Regex)], text: &str) -> Option<&'static str> {
    table
        .iter()
        .filter_map(|(name, pattern)| pattern.find(text).map(|m| (m.start(), *name)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, name)| name)
}

fn canonical_make(make: &str) -> String {
    MAKES
        .iter()
        .find(|(_, pattern)| {
            pattern
                .find(make)
                .is_some_and(|m| m.start() == 0 && m.end() == make.len())
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| to_title_case(make))
}

fn canonical_model(model: &str) -> String {
    // A bare "LC" only means Land Cruiser when it is the whole model field.
    if model.eq_ignore_ascii_case("lc") {
        return "Land Cruiser".to_string();
    }
    earliest_alias(&MODELS, model)
        .map(str::to_string)
        .unwrap_or_else(|| to_title_case(model))
}

fn parse_mileage(digits: &str) -> Option<u32> {
    digits
        .replace(',', "")
        .parse::<u32>()
        .ok()
        .filter(|n| *n <= MAX_ODOMETER)
}

fn odometer_from_field(field: &NumberOrText) -> Option<u32> {
    match field {
        NumberOrText::Number(n) => u32::try_from(*n).ok().filter(|n| *n <= MAX_ODOMETER),
        NumberOrText::Text(text) => {
            let start = text.find(|c: char| c.is_ascii_digit())?;
            let digits: String = text[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',')
                .collect();
            parse_mileage(&digits)
        }
    }
}

fn odometer_from_text(text: &str) -> Option<u32> {
    let caps = ODOMETER_TEXT.captures(text)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    parse_mileage(digits.as_str())
}
