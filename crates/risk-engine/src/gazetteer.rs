//! Static city gazetteer
//!
//! Zero-latency coordinates for the highest-volume sourcing and port cities,
//! each tagged with its country. The same table doubles as the port-city to
//! country map used by [`crate::regions::detect_country`].

use crate::geocoder::GeocodeCache;
use crate::text::{contains_word, normalize};
use crate::Coordinates;
use regex::Regex;
use std::sync::LazyLock;

/// A gazetteer entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub coordinates: Coordinates,
    pub country: &'static str,
}

/// (lowercase name, latitude, longitude, country)
static CITY_TABLE: &[(&str, f64, f64, &str)] = &[
    // United States
    ("los angeles", 34.0522, -118.2437, "United States"),
    ("long beach", 33.7701, -118.1937, "United States"),
    ("new york", 40.7128, -74.0060, "United States"),
    ("new york city", 40.7128, -74.0060, "United States"),
    ("boston", 42.3601, -71.0589, "United States"),
    ("chicago", 41.8781, -87.6298, "United States"),
    ("houston", 29.7604, -95.3698, "United States"),
    ("miami", 25.7617, -80.1918, "United States"),
    ("seattle", 47.6062, -122.3321, "United States"),
    ("san francisco", 37.7749, -122.4194, "United States"),
    ("detroit", 42.3314, -83.0458, "United States"),
    ("atlanta", 33.7490, -84.3880, "United States"),
    ("dallas", 32.7767, -96.7970, "United States"),
    ("phoenix", 33.4484, -112.0740, "United States"),
    ("portland", 45.5051, -122.6750, "United States"),
    ("savannah", 32.0835, -81.0998, "United States"),
    ("baltimore", 39.2904, -76.6122, "United States"),
    ("norfolk", 36.8508, -76.2859, "United States"),
    ("new jersey", 40.0583, -74.4057, "United States"),
    ("newark", 40.7357, -74.1724, "United States"),
    ("charleston", 32.7765, -79.9311, "United States"),
    ("jacksonville", 30.3322, -81.6557, "United States"),
    ("memphis", 35.1495, -90.0490, "United States"),
    ("new orleans", 29.9511, -90.0715, "United States"),
    ("minneapolis", 44.9778, -93.2650, "United States"),
    ("kansas city", 39.0997, -94.5786, "United States"),
    ("denver", 39.7392, -104.9903, "United States"),
    ("salt lake city", 40.7608, -111.8910, "United States"),
    ("las vegas", 36.1699, -115.1398, "United States"),
    ("san diego", 32.7157, -117.1611, "United States"),
    ("washington dc", 38.9072, -77.0369, "United States"),
    ("washington", 38.9072, -77.0369, "United States"),
    ("philadelphia", 39.9526, -75.1652, "United States"),
    ("pittsburgh", 40.4406, -79.9959, "United States"),
    ("cleveland", 41.4993, -81.6944, "United States"),
    ("cincinnati", 39.1031, -84.5120, "United States"),
    ("st louis", 38.6270, -90.1994, "United States"),
    ("nashville", 36.1627, -86.7816, "United States"),
    // China
    ("shanghai", 31.2304, 121.4737, "China"),
    ("beijing", 39.9042, 116.4074, "China"),
    ("shenzhen", 22.5431, 114.0579, "China"),
    ("guangzhou", 23.1291, 113.2644, "China"),
    ("tianjin", 39.3434, 117.3616, "China"),
    ("qingdao", 36.0671, 120.3826, "China"),
    ("ningbo", 29.8683, 121.5440, "China"),
    ("wuhan", 30.5928, 114.3055, "China"),
    ("chengdu", 30.5728, 104.0668, "China"),
    ("xian", 34.3416, 108.9398, "China"),
    ("dalian", 38.9140, 121.6147, "China"),
    ("xiamen", 24.4798, 118.0894, "China"),
    ("nanjing", 32.0603, 118.7969, "China"),
    ("hangzhou", 30.2741, 120.1551, "China"),
    ("suzhou", 31.2990, 120.5853, "China"),
    ("dongguan", 23.0207, 113.7518, "China"),
    ("foshan", 23.0219, 113.1215, "China"),
    ("zhengzhou", 34.7466, 113.6253, "China"),
    ("hong kong", 22.3193, 114.1694, "China"),
    ("macau", 22.1987, 113.5439, "China"),
    // Vietnam
    ("ho chi minh city", 10.8231, 106.6297, "Vietnam"),
    ("ho chi minh", 10.8231, 106.6297, "Vietnam"),
    ("saigon", 10.8231, 106.6297, "Vietnam"),
    ("hanoi", 21.0285, 105.8542, "Vietnam"),
    ("haiphong", 20.8449, 106.6881, "Vietnam"),
    ("da nang", 16.0544, 108.2022, "Vietnam"),
    ("bien hoa", 10.9574, 106.8426, "Vietnam"),
    ("can tho", 10.0452, 105.7469, "Vietnam"),
    // Indonesia
    ("jakarta", -6.2088, 106.8456, "Indonesia"),
    ("surabaya", -7.2575, 112.7521, "Indonesia"),
    ("bandung", -6.9175, 107.6191, "Indonesia"),
    ("medan", 3.5952, 98.6722, "Indonesia"),
    ("batam", 1.0456, 104.0305, "Indonesia"),
    ("semarang", -6.9932, 110.4203, "Indonesia"),
    // India
    ("mumbai", 19.0760, 72.8777, "India"),
    ("delhi", 28.7041, 77.1025, "India"),
    ("new delhi", 28.6139, 77.2090, "India"),
    ("chennai", 13.0827, 80.2707, "India"),
    ("kolkata", 22.5726, 88.3639, "India"),
    ("bangalore", 12.9716, 77.5946, "India"),
    ("bengaluru", 12.9716, 77.5946, "India"),
    ("hyderabad", 17.3850, 78.4867, "India"),
    ("pune", 18.5204, 73.8567, "India"),
    ("ahmedabad", 23.0225, 72.5714, "India"),
    ("surat", 21.1702, 72.8311, "India"),
    ("nhava sheva", 18.9500, 72.9500, "India"),
    ("jnpt", 18.9500, 72.9500, "India"),
    ("kochi", 9.9312, 76.2673, "India"),
    // Bangladesh
    ("dhaka", 23.8103, 90.4125, "Bangladesh"),
    ("chittagong", 22.3569, 91.7832, "Bangladesh"),
    ("gazipur", 23.9999, 90.4203, "Bangladesh"),
    ("narayanganj", 23.6238, 90.4994, "Bangladesh"),
    // Thailand
    ("bangkok", 13.7563, 100.5018, "Thailand"),
    ("laem chabang", 13.0957, 100.8924, "Thailand"),
    ("chiang mai", 18.7883, 98.9853, "Thailand"),
    ("rayong", 12.6814, 101.2816, "Thailand"),
    // Malaysia
    ("kuala lumpur", 3.1390, 101.6869, "Malaysia"),
    ("port klang", 3.0000, 101.3833, "Malaysia"),
    ("penang", 5.4164, 100.3327, "Malaysia"),
    ("johor bahru", 1.4927, 103.7414, "Malaysia"),
    ("iskandar", 1.4655, 103.7578, "Malaysia"),
    // Philippines
    ("manila", 14.5995, 120.9842, "Philippines"),
    ("cebu", 10.3157, 123.8854, "Philippines"),
    ("davao", 7.1907, 125.4553, "Philippines"),
    ("clark", 15.1800, 120.5600, "Philippines"),
    // Pakistan
    ("karachi", 24.8607, 67.0011, "Pakistan"),
    ("lahore", 31.5204, 74.3587, "Pakistan"),
    ("faisalabad", 31.4504, 73.1350, "Pakistan"),
    ("islamabad", 33.6844, 73.0479, "Pakistan"),
    ("sialkot", 32.4945, 74.5229, "Pakistan"),
    // Sri Lanka
    ("colombo", 6.9271, 79.8612, "Sri Lanka"),
    ("kandy", 7.2906, 80.6337, "Sri Lanka"),
    // Myanmar
    ("yangon", 16.8661, 96.1951, "Myanmar"),
    ("mandalay", 21.9588, 96.0891, "Myanmar"),
    // Cambodia
    ("phnom penh", 11.5564, 104.9282, "Cambodia"),
    ("sihanoukville", 10.6278, 103.5228, "Cambodia"),
    // South Korea
    ("busan", 35.1796, 129.0756, "South Korea"),
    ("seoul", 37.5665, 126.9780, "South Korea"),
    ("incheon", 37.4563, 126.7052, "South Korea"),
    ("ulsan", 35.5384, 129.3114, "South Korea"),
    // Japan
    ("tokyo", 35.6762, 139.6503, "Japan"),
    ("osaka", 34.6937, 135.5023, "Japan"),
    ("yokohama", 35.4437, 139.6380, "Japan"),
    ("nagoya", 35.1815, 136.9066, "Japan"),
    ("kobe", 34.6901, 135.1955, "Japan"),
    ("fukuoka", 33.5904, 130.4017, "Japan"),
    ("sendai", 38.2688, 140.8721, "Japan"),
    // Taiwan
    ("taipei", 25.0330, 121.5654, "Taiwan"),
    ("kaohsiung", 22.6273, 120.3014, "Taiwan"),
    ("taichung", 24.1477, 120.6736, "Taiwan"),
    ("tainan", 22.9998, 120.2269, "Taiwan"),
    // Singapore
    ("singapore", 1.3521, 103.8198, "Singapore"),
    // United Arab Emirates
    ("dubai", 25.2048, 55.2708, "United Arab Emirates"),
    ("abu dhabi", 24.4539, 54.3773, "United Arab Emirates"),
    ("sharjah", 25.3573, 55.4033, "United Arab Emirates"),
    ("jebel ali", 24.9964, 55.0542, "United Arab Emirates"),
    // Saudi Arabia
    ("jeddah", 21.4858, 39.1925, "Saudi Arabia"),
    ("riyadh", 24.6877, 46.7219, "Saudi Arabia"),
    ("dammam", 26.4207, 50.0888, "Saudi Arabia"),
    // Turkey
    ("istanbul", 41.0082, 28.9784, "Turkey"),
    ("izmir", 38.4192, 27.1287, "Turkey"),
    ("ankara", 39.9334, 32.8597, "Turkey"),
    ("bursa", 40.1885, 29.0610, "Turkey"),
    ("mersin", 36.8000, 34.6333, "Turkey"),
    ("adana", 37.0000, 35.3213, "Turkey"),
    // Egypt
    ("cairo", 30.0444, 31.2357, "Egypt"),
    ("suez", 29.9668, 32.5498, "Egypt"),
    ("alexandria", 31.2001, 29.9187, "Egypt"),
    ("port said", 31.2565, 32.2841, "Egypt"),
    // Morocco
    ("casablanca", 33.5731, -7.5898, "Morocco"),
    ("tangier", 35.7595, -5.8340, "Morocco"),
    ("rabat", 34.0209, -6.8416, "Morocco"),
    // Nigeria
    ("lagos", 6.5244, 3.3792, "Nigeria"),
    ("apapa", 6.4490, 3.3636, "Nigeria"),
    ("abuja", 9.0765, 7.3986, "Nigeria"),
    ("kano", 12.0022, 8.5920, "Nigeria"),
    // South Africa
    ("durban", -29.8587, 31.0218, "South Africa"),
    ("cape town", -33.9249, 18.4241, "South Africa"),
    ("johannesburg", -26.2041, 28.0473, "South Africa"),
    ("port elizabeth", -33.9608, 25.6022, "South Africa"),
    // Kenya
    ("mombasa", -4.0435, 39.6682, "Kenya"),
    ("nairobi", -1.2921, 36.8219, "Kenya"),
    // Germany
    ("hamburg", 53.5753, 10.0153, "Germany"),
    ("frankfurt", 50.1109, 8.6821, "Germany"),
    ("munich", 48.1351, 11.5820, "Germany"),
    ("berlin", 52.5200, 13.4050, "Germany"),
    ("bremen", 53.0793, 8.8017, "Germany"),
    ("dusseldorf", 51.2217, 6.7762, "Germany"),
    ("cologne", 50.9333, 6.9500, "Germany"),
    ("stuttgart", 48.7758, 9.1829, "Germany"),
    // Netherlands
    ("rotterdam", 51.9244, 4.4777, "Netherlands"),
    ("amsterdam", 52.3676, 4.9041, "Netherlands"),
    ("eindhoven", 51.4416, 5.4697, "Netherlands"),
    // Spain
    ("barcelona", 41.3851, 2.1734, "Spain"),
    ("valencia", 39.4699, -0.3763, "Spain"),
    ("madrid", 40.4168, -3.7038, "Spain"),
    ("bilbao", 43.2630, -2.9350, "Spain"),
    ("algeciras", 36.1408, -5.4536, "Spain"),
    // Italy
    ("genoa", 44.4056, 8.9463, "Italy"),
    ("naples", 40.8518, 14.2681, "Italy"),
    ("milan", 45.4654, 9.1859, "Italy"),
    ("rome", 41.9028, 12.4964, "Italy"),
    ("trieste", 45.6495, 13.7768, "Italy"),
    ("venice", 45.4408, 12.3155, "Italy"),
    // France
    ("le havre", 49.4938, 0.1077, "France"),
    ("marseille", 43.2965, 5.3698, "France"),
    ("paris", 48.8566, 2.3522, "France"),
    ("lyon", 45.7640, 4.8357, "France"),
    // United Kingdom
    ("london", 51.5074, -0.1278, "United Kingdom"),
    ("felixstowe", 51.9600, 1.3500, "United Kingdom"),
    ("southampton", 50.9097, -1.4044, "United Kingdom"),
    ("liverpool", 53.4084, -2.9916, "United Kingdom"),
    ("bristol", 51.4545, -2.5879, "United Kingdom"),
    ("birmingham", 52.4862, -1.8904, "United Kingdom"),
    // Belgium
    ("antwerp", 51.2194, 4.4025, "Belgium"),
    ("brussels", 50.8503, 4.3517, "Belgium"),
    ("ghent", 51.0543, 3.7174, "Belgium"),
    // Poland
    ("gdansk", 54.3520, 18.6466, "Poland"),
    ("warsaw", 52.2297, 21.0122, "Poland"),
    // Greece
    ("piraeus", 37.9422, 23.6475, "Greece"),
    ("athens", 37.9838, 23.7275, "Greece"),
    ("thessaloniki", 40.6401, 22.9444, "Greece"),
    // Mexico
    ("manzanillo", 19.1223, -104.3140, "Mexico"),
    ("veracruz", 19.1738, -96.1342, "Mexico"),
    ("mexico city", 19.4326, -99.1332, "Mexico"),
    ("guadalajara", 20.6597, -103.3496, "Mexico"),
    ("monterrey", 25.6866, -100.3161, "Mexico"),
    ("tijuana", 32.5149, -117.0382, "Mexico"),
    // Brazil
    ("santos", -23.9619, -46.3042, "Brazil"),
    ("sao paulo", -23.5505, -46.6333, "Brazil"),
    // Ukraine
    ("kyiv", 50.4501, 30.5234, "Ukraine"),
    ("kiev", 50.4501, 30.5234, "Ukraine"),
    ("kharkiv", 49.9935, 36.2304, "Ukraine"),
    ("odesa", 46.4825, 30.7233, "Ukraine"),
    ("odessa", 46.4825, 30.7233, "Ukraine"),
    ("dnipro", 48.4647, 35.0462, "Ukraine"),
    ("lviv", 49.8397, 24.0297, "Ukraine"),
    ("zaporizhzhia", 47.8388, 35.1396, "Ukraine"),
    ("mariupol", 47.0951, 37.5397, "Ukraine"),
    ("mykolaiv", 46.9750, 31.9946, "Ukraine"),
    ("chornomorsk", 46.3025, 30.6558, "Ukraine"),
    ("pivdennyi", 46.6000, 31.2000, "Ukraine"),
    // Russia
    ("moscow", 55.7558, 37.6173, "Russia"),
    ("saint petersburg", 59.9343, 30.3351, "Russia"),
    ("novorossiysk", 44.7236, 37.7688, "Russia"),
    ("vladivostok", 43.1332, 131.9113, "Russia"),
    // Romania
    ("constanta", 44.1598, 28.6348, "Romania"),
    ("bucharest", 44.4268, 26.1025, "Romania"),
    // Moldova
    ("chisinau", 47.0105, 28.8638, "Moldova"),
    // Kazakhstan
    ("almaty", 43.2220, 76.8512, "Kazakhstan"),
    // Uzbekistan
    ("tashkent", 41.2995, 69.2401, "Uzbekistan"),
    // Azerbaijan
    ("baku", 40.4093, 49.8671, "Azerbaijan"),
    // Georgia
    ("tbilisi", 41.6938, 44.8015, "Georgia"),
    // Israel
    ("tel aviv", 32.0853, 34.7818, "Israel"),
    ("haifa", 32.8191, 34.9983, "Israel"),
    ("ashdod", 31.7972, 34.6471, "Israel"),
    // Lebanon
    ("beirut", 33.8938, 35.5018, "Lebanon"),
    // Jordan
    ("amman", 31.9454, 35.9284, "Jordan"),
    // Iraq
    ("baghdad", 33.3152, 44.3661, "Iraq"),
    // Iran
    ("tehran", 35.6892, 51.3890, "Iran"),
    // Oman
    ("muscat", 23.5880, 58.3829, "Oman"),
    // Brazil (north)
    ("rio de janeiro", -22.9068, -43.1729, "Brazil"),
    ("belem", -1.4558, -48.5039, "Brazil"),
    ("manaus", -3.1190, -60.0217, "Brazil"),
    ("fortaleza", -3.7172, -38.5434, "Brazil"),
    // Canada
    ("vancouver", 49.2827, -123.1207, "Canada"),
    ("toronto", 43.6532, -79.3832, "Canada"),
    ("montreal", 45.5017, -73.5673, "Canada"),
    ("halifax", 44.6488, -63.5752, "Canada"),
    ("prince rupert", 54.3150, -130.3208, "Canada"),
];

/// Entries ordered longest name first so "hong kong" is tried before "kong"
/// and "new york city" before "new york". Ties keep table order.
static LONGEST_FIRST: LazyLock<Vec<City>> = LazyLock::new(|| {
    let mut cities: Vec<City> = CITY_TABLE
        .iter()
        .map(|&(name, lat, lon, country)| City {
            name,
            coordinates: Coordinates::new(lat, lon),
            country,
        })
        .collect();
    cities.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
    cities
});

/// Capitalised one- or two-word phrases that might be place names
static CAPITALIZED_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]{2,}(?:\s[A-Z][a-z]{2,})?)\b").expect("valid capitalised-phrase regex")
});

/// Capitalised words that are never places
const STOPWORDS: &[&str] = &[
    "The", "This", "That", "With", "From", "Into", "Over", "After", "Before", "During",
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    "January", "February", "March", "April", "June", "July", "August", "September",
    "October", "November", "December", "Reuters", "Bloomberg", "Associated", "Press", "News",
];

/// Number of entries in the table
pub fn len() -> usize {
    CITY_TABLE.len()
}

/// Exact lookup by city name (case-insensitive)
pub fn lookup(city: &str) -> Option<Coordinates> {
    find_entry(city).map(|c| c.coordinates)
}

/// Country a known city belongs to
pub fn city_country(city: &str) -> Option<&'static str> {
    find_entry(city).map(|c| c.country)
}

fn find_entry(city: &str) -> Option<City> {
    let key = normalize(city);
    CITY_TABLE
        .iter()
        .find(|(name, ..)| *name == key)
        .map(|&(name, lat, lon, country)| City {
            name,
            coordinates: Coordinates::new(lat, lon),
            country,
        })
}

/// Longest gazetteer city mentioned in `text` on word boundaries
pub fn find_city(text: &str) -> Option<City> {
    let lower = text.to_lowercase();
    LONGEST_FIRST
        .iter()
        .find(|city| contains_word(&lower, city.name))
        .copied()
}

/// Coordinates of the first place mentioned in free text.
///
/// Scans the gazetteer first. Failing that, every capitalised one- or
/// two-word phrase that is not a stopword is tried against the geocode
/// cache without touching the network. Best effort: non-Western names
/// without the expected capitalisation are missed.
pub fn extract_city_mentions(text: &str, cache: Option<&GeocodeCache>) -> Option<Coordinates> {
    if text.trim().is_empty() {
        return None;
    }
    if let Some(city) = find_city(text) {
        return Some(city.coordinates);
    }

    let cache = cache?;
    CAPITALIZED_PHRASE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|candidate| !STOPWORDS.contains(candidate))
        .find_map(|candidate| cache.resolve_cached_only(candidate, ""))
}
