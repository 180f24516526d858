//! A small in-memory gazetteer shared by the unit tests.

use std::sync::{Arc, LazyLock};

use geoscrub_gazetteer::{EnglishVariants, Gazetteer, GazetteerBuilder, NullProgress};
use geoscrub_gazetteer_models::{
    AdminCodes, AlternateName, CountryInfo, Entity, EntityKind, GazetteerConfig, LanguageTag,
    POSTAL_ID_BASE,
};

pub const SYDNEY_AU: u64 = 2_147_714;
pub const SYDNEY_CA: u64 = 6_354_908;
pub const SYDNEY_US: u64 = 4_174_600;
pub const ST_PETERSBURG_RU: u64 = 498_817;
pub const ST_PETERSBURG_US: u64 = 4_171_563;
pub const COAL_CITY: u64 = 4_888_270;
pub const COAL_TOWNSHIP_MO: u64 = 12_000_002;
pub const O_FALLON_MO: u64 = 4_402_245;
pub const SPRINGFIELD_IL: u64 = 4_250_542;
pub const KITAKYUSHU: u64 = 1_859_307;
pub const SAN_JUAN: u64 = 4_568_127;
pub const LONDON: u64 = 2_643_743;

pub const NEW_SOUTH_WALES: u64 = 2_155_400;
pub const FLORIDA: u64 = 4_155_751;
pub const FLEVOLAND: u64 = 3_319_179;
pub const HOKKAIDO: u64 = 2_130_037;
pub const PINELLAS_COUNTY: u64 = 4_168_618;

static WORLD: LazyLock<Arc<Gazetteer>> = LazyLock::new(|| Arc::new(build()));

/// The shared fixture gazetteer.
pub fn world() -> Arc<Gazetteer> {
    Arc::clone(&WORLD)
}

/// `(iso, iso3, numeric, name, capital, continent, population, languages, geoname id)`
type CountryRow = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, u64, &'static str, u64);

const COUNTRIES: &[CountryRow] = &[
    ("AU", "AUS", "036", "Australia", "Canberra", "OC", 25_000_000, "en-AU", 2_077_456),
    ("CA", "CAN", "124", "Canada", "Ottawa", "NA", 37_000_000, "en-CA,fr-CA", 6_251_999),
    ("US", "USA", "840", "United States", "Washington", "NA", 327_000_000, "en-US,es-US,haw,fr", 6_252_001),
    ("RU", "RUS", "643", "Russia", "Moscow", "EU", 144_000_000, "ru,tt,xal", 2_017_370),
    ("GB", "GBR", "826", "United Kingdom", "London", "EU", 66_000_000, "en-GB,cy-GB,gd", 2_635_167),
    ("NL", "NLD", "528", "Netherlands", "Amsterdam", "EU", 17_000_000, "nl-NL,fy-NL", 2_750_405),
    ("NZ", "NZL", "554", "New Zealand", "Wellington", "OC", 4_800_000, "en-NZ,mi", 2_186_224),
    ("JP", "JPN", "392", "Japan", "Tokyo", "AS", 126_000_000, "ja", 1_861_060),
    ("PR", "PRI", "630", "Puerto Rico", "San Juan", "NA", 3_100_000, "en-PR,es-PR", 4_566_966),
    ("DE", "DEU", "276", "Germany", "Berlin", "EU", 82_000_000, "de", 2_921_044),
    ("UY", "URY", "858", "Uruguay", "Montevideo", "SA", 3_400_000, "es-UY", 3_439_705),
    ("KR", "KOR", "410", "South Korea", "Seoul", "AS", 51_000_000, "ko-KR,en", 1_835_841),
    ("KP", "PRK", "408", "North Korea", "Pyongyang", "AS", 25_000_000, "ko-KP", 1_873_107),
];

/// `(id, name, ascii name, kind, feature code, country, admin1, admin2, population, lat, lon)`
type EntityRow = (u64, &'static str, &'static str, EntityKind, &'static str, &'static str, &'static str, &'static str, u64, f64, f64);

const ENTITIES: &[EntityRow] = &[
    // first-order divisions
    (NEW_SOUTH_WALES, "New South Wales", "New South Wales", EntityKind::Admin1, "ADM1", "AU", "02", "", 8_166_000, -33.0, 146.0),
    (2_145_234, "Victoria", "Victoria", EntityKind::Admin1, "ADM1", "AU", "07", "", 6_500_000, -37.0, 145.0),
    (2_058_645, "Western Australia", "Western Australia", EntityKind::Admin1, "ADM1", "AU", "08", "", 2_667_130, -25.0, 122.0),
    (6_091_530, "Nova Scotia", "Nova Scotia", EntityKind::Admin1, "ADM1", "CA", "07", "", 923_598, 45.0, -63.0),
    (FLORIDA, "Florida", "Florida", EntityKind::Admin1, "ADM1", "US", "FL", "", 21_538_187, 28.75, -82.5),
    (4_896_861, "Illinois", "Illinois", EntityKind::Admin1, "ADM1", "US", "IL", "", 12_812_508, 40.0, -89.25),
    (4_398_678, "Missouri", "Missouri", EntityKind::Admin1, "ADM1", "US", "MO", "", 6_154_913, 38.25, -92.5),
    (4_736_286, "Texas", "Texas", EntityKind::Admin1, "ADM1", "US", "TX", "", 29_145_505, 31.25, -99.25),
    (5_815_135, "Washington", "Washington", EntityKind::Admin1, "ADM1", "US", "WA", "", 7_705_281, 47.5, -120.5),
    (FLEVOLAND, "Flevoland", "Flevoland", EntityKind::Admin1, "ADM1", "NL", "16", "", 423_021, 52.5, 5.75),
    (536_203, "Sankt-Peterburg", "Sankt-Peterburg", EntityKind::Admin1, "ADM1", "RU", "66", "", 5_351_935, 59.92, 30.25),
    (1_863_958, "Fukuoka", "Fukuoka", EntityKind::Admin1, "ADM1", "JP", "07", "", 5_100_000, 33.6, 130.6),
    (HOKKAIDO, "Hokkaido", "Hokkaido", EntityKind::Admin1, "ADM1", "JP", "12", "", 5_250_000, 43.5, 143.0),
    (2_953_481, "Baden-Württemberg", "Baden-Wuerttemberg", EntityKind::Admin1, "ADM1", "DE", "01", "", 11_100_000, 48.5, 9.0),
    (3_442_584, "Florida", "Florida", EntityKind::Admin1, "ADM1", "UY", "07", "", 67_047, -33.9, -56.0),
    (6_269_131, "England", "England", EntityKind::Admin1, "ADM1", "GB", "ENG", "", 55_000_000, 52.2, -1.2),
    // second-order divisions and districts
    (7_839_805, "City of Sydney", "City of Sydney", EntityKind::Admin2, "ADM2", "AU", "02", "17200", 240_229, -33.88, 151.2),
    (PINELLAS_COUNTY, "Pinellas County", "Pinellas County", EntityKind::Admin2, "ADM2", "US", "FL", "103", 959_107, 27.9, -82.7),
    (4_894_880, "Grundy County", "Grundy County", EntityKind::Admin2, "ADM2", "US", "IL", "063", 52_533, 41.28, -88.4),
    (4_250_500, "Sangamon County", "Sangamon County", EntityKind::Admin2, "ADM2", "US", "IL", "167", 196_343, 39.76, -89.66),
    (3_333_231, "West Midlands", "West Midlands", EntityKind::AdminDistrict, "ADMD", "GB", "ENG", "", 2_900_000, 52.5, -1.9),
    // cities
    (SYDNEY_AU, "Sydney", "Sydney", EntityKind::City, "PPLA", "AU", "02", "17200", 4_627_345, -33.867_85, 151.207_32),
    (SYDNEY_CA, "Sydney", "Sydney", EntityKind::City, "PPL", "CA", "07", "", 105_968, 46.1351, -60.1831),
    (SYDNEY_US, "Sydney", "Sydney", EntityKind::City, "PPL", "US", "FL", "057", 1_000, 27.9637, -82.2089),
    (ST_PETERSBURG_RU, "Saint Petersburg", "Saint Petersburg", EntityKind::City, "PPLA", "RU", "66", "", 5_351_935, 59.938_63, 30.314_13),
    (ST_PETERSBURG_US, "St. Petersburg", "St. Petersburg", EntityKind::City, "PPL", "US", "FL", "103", 258_308, 27.770_86, -82.679_27),
    (COAL_CITY, "Coal City", "Coal City", EntityKind::City, "PPL", "US", "IL", "063", 5_587, 41.287_81, -88.285_62),
    (COAL_TOWNSHIP_MO, "Coal Township", "Coal Township", EntityKind::City, "PPL", "US", "MO", "", 350, 38.35, -93.55),
    (O_FALLON_MO, "O'Fallon", "O'Fallon", EntityKind::City, "PPL", "US", "MO", "183", 88_673, 38.810_61, -90.699_85),
    (4_245_926, "O'Fallon", "O'Fallon", EntityKind::City, "PPL", "US", "IL", "163", 29_736, 38.592_27, -89.911_21),
    (SPRINGFIELD_IL, "Springfield", "Springfield", EntityKind::City, "PPLA", "US", "IL", "167", 116_250, 39.801_72, -89.643_71),
    (12_000_001, "Springfield", "Springfield", EntityKind::City, "PPLX", "US", "IL", "167", 1_200, 39.799, -89.644),
    (4_409_896, "Springfield", "Springfield", EntityKind::City, "PPLA2", "US", "MO", "077", 169_176, 37.215_33, -93.298_24),
    (KITAKYUSHU, "Kitakyushu", "Kitakyushu", EntityKind::City, "PPLA2", "JP", "07", "", 997_536, 33.851_81, 130.850_34),
    (2_128_295, "Sapporo", "Sapporo", EntityKind::City, "PPLA", "JP", "12", "", 1_883_027, 43.064_17, 141.346_94),
    (SAN_JUAN, "San Juan", "San Juan", EntityKind::City, "PPLC", "PR", "127", "", 418_140, 18.466_33, -66.105_72),
    (2_942_310, "Buchen", "Buchen", EntityKind::City, "PPL", "DE", "01", "", 18_000, 49.524_16, 9.322_93),
    (2_193_733, "Auckland", "Auckland", EntityKind::City, "PPLA", "NZ", "E7", "", 417_910, -36.848_53, 174.763_49),
    (LONDON, "London", "London", EntityKind::City, "PPLC", "GB", "ENG", "GLA", 8_961_989, 51.508_53, -0.125_74),
];

/// `(entity id, text, language column, preferred)`
const ALTERNATE_NAMES: &[(u64, &str, &str, bool)] = &[
    (2_017_370, "Russia", "en", true),
    (2_017_370, "Russian Federation", "en", false),
    (2_017_370, "Россия", "ru", true),
    (2_017_370, "Российская Федерация", "ru", false),
    (1_861_060, "日本", "ja", true),
    (1_835_841, "Korea", "en", false),
    (1_873_107, "Korea", "en", false),
    (6_252_001, "United States of America", "en", false),
    (2_635_167, "Great Britain", "en", false),
    (NEW_SOUTH_WALES, "NSW", "abbr", false),
    (2_145_234, "VIC", "abbr", false),
    (2_058_645, "WA", "abbr", false),
    (6_091_530, "NS", "abbr", false),
    (FLORIDA, "FL", "abbr", false),
    (4_896_861, "IL", "abbr", false),
    (4_398_678, "MO", "abbr", false),
    (4_736_286, "TX", "abbr", false),
    (5_815_135, "WA", "abbr", false),
    (FLEVOLAND, "FL", "abbr", false),
    (536_203, "Санкт-Петербург", "ru", false),
    (1_863_958, "福岡県", "ja", false),
    (HOKKAIDO, "北海道", "ja", false),
    (HOKKAIDO, "Hokkaidō", "de", false),
    (ST_PETERSBURG_RU, "St. Petersburg", "en", false),
    (ST_PETERSBURG_RU, "Sankt-Peterburg", "", false),
    (ST_PETERSBURG_RU, "Санкт-Петербург", "ru", true),
    (ST_PETERSBURG_RU, "Leningrad", "en", false),
    (ST_PETERSBURG_US, "Saint Petersburg", "en", false),
    (KITAKYUSHU, "北九州市", "ja", false),
    (2_128_295, "札幌", "ja", false),
    (2_942_310, "Buchen (Odenwald)", "de", false),
];

fn country_info(row: &CountryRow) -> CountryInfo {
    let (iso, iso3, numeric, name, capital, continent, population, languages, geoname_id) = *row;
    CountryInfo {
        iso: iso.to_string(),
        iso3: iso3.to_string(),
        iso_numeric: numeric.to_string(),
        name: name.to_string(),
        capital: capital.to_string(),
        continent: continent.to_string(),
        population,
        tld: format!(".{}", iso.to_lowercase()),
        currency_code: String::new(),
        languages: languages.split(',').map(str::to_string).collect(),
        geoname_id: Some(geoname_id),
    }
}

fn entity(row: &EntityRow) -> Entity {
    let (id, name, ascii_name, kind, feature_code, country, admin1, admin2, population, lat, lon) =
        *row;
    let code = |c: &str| Some(c.to_string()).filter(|c| !c.is_empty());
    Entity {
        id,
        name: name.to_string(),
        ascii_name: ascii_name.to_string(),
        kind,
        feature_code: feature_code.to_string(),
        country_code: country.to_string(),
        admin_codes: AdminCodes {
            admin1: code(admin1),
            admin2: code(admin2),
            admin3: None,
            admin4: None,
        },
        population,
        latitude: lat,
        longitude: lon,
        timezone: None,
        postal_code: None,
    }
}

fn build() -> Gazetteer {
    let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());

    for row in COUNTRIES {
        let info = country_info(row);
        builder.add_entity(Entity {
            id: row.8,
            name: info.name.clone(),
            ascii_name: info.name.clone(),
            kind: EntityKind::Country,
            feature_code: "PCLI".to_string(),
            country_code: info.iso.clone(),
            admin_codes: AdminCodes::default(),
            population: info.population,
            latitude: 0.0,
            longitude: 0.0,
            timezone: None,
            postal_code: None,
        });
        builder.add_country(info);
    }

    for row in ENTITIES {
        builder.add_entity(entity(row));
    }

    let springfield = ENTITIES
        .iter()
        .find(|row| row.0 == SPRINGFIELD_IL)
        .expect("Springfield fixture");
    builder.add_entity(Entity {
        id: POSTAL_ID_BASE + 1,
        kind: EntityKind::PostalArea,
        feature_code: String::new(),
        postal_code: Some("62701".to_string()),
        population: 0,
        ..entity(springfield)
    });

    for (id, (entity_id, text, language, preferred)) in (1u64..).zip(ALTERNATE_NAMES) {
        builder.add_alternate_name(AlternateName {
            id,
            entity_id: *entity_id,
            text: (*text).to_string(),
            language: LanguageTag::from_column(language),
            is_preferred: *preferred,
            is_short: false,
            is_colloquial: false,
            is_historic: false,
            is_derived: false,
        });
    }

    builder.build(&EnglishVariants, &NullProgress).0
}

#[cfg(test)]
mod tests {
    use geoscrub_gazetteer::name_index::query_form;

    use super::*;

    #[test]
    fn every_entity_is_reachable_by_name() {
        let gazetteer = world();
        for entity in gazetteer.store().entities() {
            for name in [&entity.name, &entity.ascii_name] {
                let refs = gazetteer.lookup(&query_form(name));
                assert!(
                    refs.iter().any(|r| r.entity_id == entity.id),
                    "{} ({name:?}) missing from the name index",
                    entity.id
                );
            }
        }
    }
}
