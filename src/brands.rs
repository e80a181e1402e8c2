use std::collections::HashSet;

/// Car and motorcycle manufacturers as they appear in the price list headings.
pub const DEFAULT_BRANDS: &[&str] = &[
    // cars
    "AION",
    "ALFA ROMEO",
    "ASTON MARTIN",
    "AUDI",
    "AUSTIN",
    "AVATR",
    "BENTLEY",
    "BMW",
    "BYD",
    "CADILLAC",
    "CHANGAN",
    "CHERY",
    "CHEVROLET",
    "CHRYSLER",
    "CITROEN",
    "DAIHATSU",
    "DEEPAL",
    "DENZA",
    "DFSK",
    "FERRARI",
    "FIAT",
    "FORD",
    "GEELY",
    "GWM TANK",
    "HAVAL",
    "HINO",
    "HONDA",
    "HUMMER",
    "HYUNDAI",
    "ISUZU",
    "JAECOO",
    "JAGUAR",
    "JEEP",
    "KIA",
    "LAMBORGHINI",
    "LAND ROVER",
    "LEAPMOTOR",
    "LEXUS",
    "LOTUS",
    "MASERATI",
    "MAZDA",
    "MCLAREN",
    "MERCEDES BENZ",
    "MG",
    "MINI",
    "MITSUBISHI",
    "MITSUOKA",
    "NAZA",
    "NETA",
    "NISSAN",
    "OMODA",
    "OPEL",
    "ORA",
    "PEEUGEOT",
    "PORSCHE",
    "PROTON",
    "RANGE ROVER",
    "RIDDARA",
    "ROLLS-ROYCE",
    "ROVER",
    "SAAB",
    "SEAT",
    "SKODA",
    "SSANGYONG",
    "SUBARU",
    "SUZUKI",
    "TATA",
    "TESLA",
    "THAIRUNG",
    "TOYOTA",
    "VOLKSWAGEN",
    "VOLVO",
    "WULING",
    "XPENG",
    "ZEEKR",
    // motorcycles
    "AJ",
    "APRILIA",
    "ARIIC",
    "BAJAJ",
    "BENELLI",
    "CFMOTO",
    "DECO",
    "DUCATI",
    "EM",
    "GPX",
    "H SEM",
    "HAONAIQI",
    "HARLEY DAVIDSON",
    "HUSQVARNA",
    "INDIAN",
    "JRD",
    "KAVALLO",
    "KAWASAKI",
    "KTM",
    "LAMBRETTA",
    "LION",
    "M-BIKE",
    "MOTO GUZZI",
    "MV AGUSTA",
    "PIAGGIO",
    "PLATINUM",
    "ROYAL ENFIELD",
    "RYUKA",
    "SCOMADI",
    "SOLAR",
    "STALLIONS",
    "SYM",
    "TIGER",
    "TRIUMPH",
    "VESPA",
    "YAMAHA",
];

/// Exact-match set of brand headings. Lookups are case-sensitive and do no
/// trimming of their own; callers pass the already-trimmed line.
#[derive(Debug, Clone)]
pub struct BrandDictionary {
    names: HashSet<String>,
}

impl BrandDictionary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in list extended with `extra`.
    pub fn with_extra(extra: &[String]) -> Self {
        let mut dict = Self::default();
        dict.names.extend(extra.iter().cloned());
        dict
    }

    pub fn contains(&self, line: &str) -> bool {
        self.names.contains(line)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BrandDictionary {
    fn default() -> Self {
        Self::new(DEFAULT_BRANDS.iter().copied())
    }
}
