//! The closed registry of reference-data operations. A [Query] is both the cache key and the description of the
//! bridge call: its variant names the command, its fields are the arguments. Identity is structural, so two
//! separately built `Query::GetType { type_id: 587 }` values hit the same cache entry.

// System libraries.
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// Third party libraries.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Project libraries.
use crate::error::CacheError;

pub type TypeId = i64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
}

/// Security status bound used by range queries. Floats are not [Eq], so identity is the bit pattern, with `-0.0`
/// folded into `0.0`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Security(pub f64);

impl Security {
    fn identity_bits(&self) -> u64 {
        if self.0 == 0.0 { 0 } else { self.0.to_bits() }
    }
}

impl PartialEq for Security {
    fn eq(&self, other: &Self) -> bool {
        self.identity_bits() == other.identity_bits()
    }
}

impl Eq for Security {}

impl Hash for Security {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_bits().hash(state);
    }
}

impl From<f64> for Security {
    fn from(value: f64) -> Self {
        Security(value)
    }
}

/// Flavour of a graphic asset. Sent to the bridge as its numeric code.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GraphicType {
    #[default]
    Icon,
    Blueprint,
    BlueprintCopy,
}

impl From<GraphicType> for u8 {
    fn from(value: GraphicType) -> Self {
        match value {
            GraphicType::Icon => 0,
            GraphicType::Blueprint => 1,
            GraphicType::BlueprintCopy => 2,
        }
    }
}

impl TryFrom<u8> for GraphicType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GraphicType::Icon),
            1 => Ok(GraphicType::Blueprint),
            2 => Ok(GraphicType::BlueprintCopy),
            other => Err(format!("unknown graphic type {other}")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(
    tag = "command",
    content = "args",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Query {
    GetGraphicPath { graphic_id: i64, graphic_type: GraphicType },
    GetIconPath { icon_id: i64 },
    GetSkinMaterialPath { skin_material_id: i64 },
    GetFactionIconPath { icon_id: i64 },
    GetFactionLogoPath { logo_id: String },
    GetLocalization { key: i64 },
    #[serde(rename = "get_localization_by_language")]
    GetLocalizationByLang { key: i64, language: Language },
    #[serde(rename = "get_ui_localization_by_language")]
    GetUiLocalizationByLang { key: String, language: Language },
    GetGroup { group_id: i64 },
    GetCategory { category_id: i64 },
    GetMetaGroup { meta_group_id: i64 },
    GetType { type_id: TypeId },
    SearchTypeByName { name: String, language: Language, limit: u32 },
    SearchTypeByDescription { desc: String, language: Language, limit: u32 },
    SearchRegionByName { name: String, language: Language },
    SearchConstellationByName { name: String, language: Language },
    SearchSystemByName { name: String, language: Language },
    GetSkin { skin_id: i64 },
    GetSkinMaterial { skin_material_id: i64 },
    GetSkinLicense { license_id: i64 },
    GetSkinMaterialIdByLicense { license_id: i64 },
    GetLicensesBySkin { skin_id: i64 },
    GetFaction { faction_id: i64 },
    GetFactionIds,
    GetMarketGroup { market_group_id: i64 },
    GetLinkUrl { key: String, params: BTreeMap<String, String> },
    GetRegionById { region_id: i64 },
    GetRegionsByFactionId { faction_id: Option<i64> },
    GetRegionsByWormholeClassId { class_id: Option<i64> },
    GetConstellationById { constellation_id: i64 },
    GetConstellationsByRegionId { region_id: i64 },
    GetConstellationsByFactionId { faction_id: Option<i64> },
    GetConstellationsByWormholeClassId { class_id: Option<i64> },
    GetSystemById { solar_system_id: i64 },
    GetSystemsByRegionId { region_id: i64 },
    GetSystemsByConstellationId { constellation_id: i64 },
    GetSystemsByFactionId { faction_id: Option<i64> },
    GetSystemsByWormholeClassId { class_id: Option<i64> },
    GetSystemsBySecurityRange { min: Security, max: Security },
    GetPlanetById { planet_id: i64 },
    GetMoonById { moon_id: i64 },
    GetNpcStationById { station_id: i64 },
    GetNpcCorporationById { npc_corporation_id: i64 },
}

/// Fieldless twin of [Query], used wherever only the operation name matters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    GetGraphicPath,
    GetIconPath,
    GetSkinMaterialPath,
    GetFactionIconPath,
    GetFactionLogoPath,
    GetLocalization,
    GetLocalizationByLang,
    GetUiLocalizationByLang,
    GetGroup,
    GetCategory,
    GetMetaGroup,
    GetType,
    SearchTypeByName,
    SearchTypeByDescription,
    SearchRegionByName,
    SearchConstellationByName,
    SearchSystemByName,
    GetSkin,
    GetSkinMaterial,
    GetSkinLicense,
    GetSkinMaterialIdByLicense,
    GetLicensesBySkin,
    GetFaction,
    GetFactionIds,
    GetMarketGroup,
    GetLinkUrl,
    GetRegionById,
    GetRegionsByFactionId,
    GetRegionsByWormholeClassId,
    GetConstellationById,
    GetConstellationsByRegionId,
    GetConstellationsByFactionId,
    GetConstellationsByWormholeClassId,
    GetSystemById,
    GetSystemsByRegionId,
    GetSystemsByConstellationId,
    GetSystemsByFactionId,
    GetSystemsByWormholeClassId,
    GetSystemsBySecurityRange,
    GetPlanetById,
    GetMoonById,
    GetNpcStationById,
    GetNpcCorporationById,
}

impl Operation {
    pub const ALL: [Operation; 43] = [
        Operation::GetGraphicPath,
        Operation::GetIconPath,
        Operation::GetSkinMaterialPath,
        Operation::GetFactionIconPath,
        Operation::GetFactionLogoPath,
        Operation::GetLocalization,
        Operation::GetLocalizationByLang,
        Operation::GetUiLocalizationByLang,
        Operation::GetGroup,
        Operation::GetCategory,
        Operation::GetMetaGroup,
        Operation::GetType,
        Operation::SearchTypeByName,
        Operation::SearchTypeByDescription,
        Operation::SearchRegionByName,
        Operation::SearchConstellationByName,
        Operation::SearchSystemByName,
        Operation::GetSkin,
        Operation::GetSkinMaterial,
        Operation::GetSkinLicense,
        Operation::GetSkinMaterialIdByLicense,
        Operation::GetLicensesBySkin,
        Operation::GetFaction,
        Operation::GetFactionIds,
        Operation::GetMarketGroup,
        Operation::GetLinkUrl,
        Operation::GetRegionById,
        Operation::GetRegionsByFactionId,
        Operation::GetRegionsByWormholeClassId,
        Operation::GetConstellationById,
        Operation::GetConstellationsByRegionId,
        Operation::GetConstellationsByFactionId,
        Operation::GetConstellationsByWormholeClassId,
        Operation::GetSystemById,
        Operation::GetSystemsByRegionId,
        Operation::GetSystemsByConstellationId,
        Operation::GetSystemsByFactionId,
        Operation::GetSystemsByWormholeClassId,
        Operation::GetSystemsBySecurityRange,
        Operation::GetPlanetById,
        Operation::GetMoonById,
        Operation::GetNpcStationById,
        Operation::GetNpcCorporationById,
    ];

    /// Name of the native bridge command. Must agree with the serde tag of the matching [Query] variant.
    pub fn command(self) -> &'static str {
        match self {
            Operation::GetGraphicPath => "get_graphic_path",
            Operation::GetIconPath => "get_icon_path",
            Operation::GetSkinMaterialPath => "get_skin_material_path",
            Operation::GetFactionIconPath => "get_faction_icon_path",
            Operation::GetFactionLogoPath => "get_faction_logo_path",
            Operation::GetLocalization => "get_localization",
            Operation::GetLocalizationByLang => "get_localization_by_language",
            Operation::GetUiLocalizationByLang => "get_ui_localization_by_language",
            Operation::GetGroup => "get_group",
            Operation::GetCategory => "get_category",
            Operation::GetMetaGroup => "get_meta_group",
            Operation::GetType => "get_type",
            Operation::SearchTypeByName => "search_type_by_name",
            Operation::SearchTypeByDescription => "search_type_by_description",
            Operation::SearchRegionByName => "search_region_by_name",
            Operation::SearchConstellationByName => "search_constellation_by_name",
            Operation::SearchSystemByName => "search_system_by_name",
            Operation::GetSkin => "get_skin",
            Operation::GetSkinMaterial => "get_skin_material",
            Operation::GetSkinLicense => "get_skin_license",
            Operation::GetSkinMaterialIdByLicense => "get_skin_material_id_by_license",
            Operation::GetLicensesBySkin => "get_licenses_by_skin",
            Operation::GetFaction => "get_faction",
            Operation::GetFactionIds => "get_faction_ids",
            Operation::GetMarketGroup => "get_market_group",
            Operation::GetLinkUrl => "get_link_url",
            Operation::GetRegionById => "get_region_by_id",
            Operation::GetRegionsByFactionId => "get_regions_by_faction_id",
            Operation::GetRegionsByWormholeClassId => "get_regions_by_wormhole_class_id",
            Operation::GetConstellationById => "get_constellation_by_id",
            Operation::GetConstellationsByRegionId => "get_constellations_by_region_id",
            Operation::GetConstellationsByFactionId => "get_constellations_by_faction_id",
            Operation::GetConstellationsByWormholeClassId => "get_constellations_by_wormhole_class_id",
            Operation::GetSystemById => "get_system_by_id",
            Operation::GetSystemsByRegionId => "get_systems_by_region_id",
            Operation::GetSystemsByConstellationId => "get_systems_by_constellation_id",
            Operation::GetSystemsByFactionId => "get_systems_by_faction_id",
            Operation::GetSystemsByWormholeClassId => "get_systems_by_wormhole_class_id",
            Operation::GetSystemsBySecurityRange => "get_systems_by_security_range",
            Operation::GetPlanetById => "get_planet_by_id",
            Operation::GetMoonById => "get_moon_by_id",
            Operation::GetNpcStationById => "get_npc_station_by_id",
            Operation::GetNpcCorporationById => "get_npc_corporation_by_id",
        }
    }

    /// The camelCase name the frontend data API used for the same call, e.g. `getType`. Mostly the command in camel
    /// case, except where the API shortened "language" to "Lang".
    pub fn api_name(self) -> String {
        match self {
            Operation::GetLocalizationByLang => "getLocalizationByLang".to_string(),
            Operation::GetUiLocalizationByLang => "getUiLocalizationByLang".to_string(),
            _ => camel_case(self.command()),
        }
    }
}

fn camel_case(snake: &str) -> String {
    let mut name = String::new();
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for Operation {
    type Err = CacheError;

    /// Accepts both the bridge command (`get_type`) and the API name (`getType`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.command() == s || op.api_name() == s)
            .ok_or_else(|| CacheError::UnknownOperation(s.to_string()))
    }
}

impl Query {
    pub fn operation(&self) -> Operation {
        match self {
            Query::GetGraphicPath { .. } => Operation::GetGraphicPath,
            Query::GetIconPath { .. } => Operation::GetIconPath,
            Query::GetSkinMaterialPath { .. } => Operation::GetSkinMaterialPath,
            Query::GetFactionIconPath { .. } => Operation::GetFactionIconPath,
            Query::GetFactionLogoPath { .. } => Operation::GetFactionLogoPath,
            Query::GetLocalization { .. } => Operation::GetLocalization,
            Query::GetLocalizationByLang { .. } => Operation::GetLocalizationByLang,
            Query::GetUiLocalizationByLang { .. } => Operation::GetUiLocalizationByLang,
            Query::GetGroup { .. } => Operation::GetGroup,
            Query::GetCategory { .. } => Operation::GetCategory,
            Query::GetMetaGroup { .. } => Operation::GetMetaGroup,
            Query::GetType { .. } => Operation::GetType,
            Query::SearchTypeByName { .. } => Operation::SearchTypeByName,
            Query::SearchTypeByDescription { .. } => Operation::SearchTypeByDescription,
            Query::SearchRegionByName { .. } => Operation::SearchRegionByName,
            Query::SearchConstellationByName { .. } => Operation::SearchConstellationByName,
            Query::SearchSystemByName { .. } => Operation::SearchSystemByName,
            Query::GetSkin { .. } => Operation::GetSkin,
            Query::GetSkinMaterial { .. } => Operation::GetSkinMaterial,
            Query::GetSkinLicense { .. } => Operation::GetSkinLicense,
            Query::GetSkinMaterialIdByLicense { .. } => Operation::GetSkinMaterialIdByLicense,
            Query::GetLicensesBySkin { .. } => Operation::GetLicensesBySkin,
            Query::GetFaction { .. } => Operation::GetFaction,
            Query::GetFactionIds => Operation::GetFactionIds,
            Query::GetMarketGroup { .. } => Operation::GetMarketGroup,
            Query::GetLinkUrl { .. } => Operation::GetLinkUrl,
            Query::GetRegionById { .. } => Operation::GetRegionById,
            Query::GetRegionsByFactionId { .. } => Operation::GetRegionsByFactionId,
            Query::GetRegionsByWormholeClassId { .. } => Operation::GetRegionsByWormholeClassId,
            Query::GetConstellationById { .. } => Operation::GetConstellationById,
            Query::GetConstellationsByRegionId { .. } => Operation::GetConstellationsByRegionId,
            Query::GetConstellationsByFactionId { .. } => Operation::GetConstellationsByFactionId,
            Query::GetConstellationsByWormholeClassId { .. } => Operation::GetConstellationsByWormholeClassId,
            Query::GetSystemById { .. } => Operation::GetSystemById,
            Query::GetSystemsByRegionId { .. } => Operation::GetSystemsByRegionId,
            Query::GetSystemsByConstellationId { .. } => Operation::GetSystemsByConstellationId,
            Query::GetSystemsByFactionId { .. } => Operation::GetSystemsByFactionId,
            Query::GetSystemsByWormholeClassId { .. } => Operation::GetSystemsByWormholeClassId,
            Query::GetSystemsBySecurityRange { .. } => Operation::GetSystemsBySecurityRange,
            Query::GetPlanetById { .. } => Operation::GetPlanetById,
            Query::GetMoonById { .. } => Operation::GetMoonById,
            Query::GetNpcStationById { .. } => Operation::GetNpcStationById,
            Query::GetNpcCorporationById { .. } => Operation::GetNpcCorporationById,
        }
    }

    pub fn command(&self) -> &'static str {
        self.operation().command()
    }

    /// Argument object for the bridge call, with camelCase keys (`{"typeId": 587}`).
    pub fn args(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut wire| wire.get_mut("args").map(Value::take))
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Build a query from a dynamic `(command, args)` pair. The command may be either naming style.
    pub fn from_wire(command: &str, args: Value) -> Result<Self, CacheError> {
        let operation: Operation = command.parse()?;
        let mut wire = Map::new();
        wire.insert("command".to_string(), Value::from(operation.command()));
        // Unit variants carry no content at all.
        let has_args = match &args {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        };
        if has_args {
            wire.insert("args".to_string(), args);
        }
        serde_json::from_value(Value::Object(wire)).map_err(|e| CacheError::MalformedParams {
            command: command.to_string(),
            message: e.to_string(),
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.command(), self.args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;

    fn hash_value<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_structural_identity() {
        let a = Query::GetType { type_id: 587 };
        let b = Query::GetType { type_id: 587 };
        let c = Query::GetType { type_id: 588 };
        assert_eq!(a, b);
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_ne!(a, c);
        assert_ne!(a, Query::GetGroup { group_id: 587 });
    }

    #[test]
    fn test_nested_params_identity() {
        let mut params = BTreeMap::new();
        params.insert("typeId".to_string(), "34".to_string());
        let a = Query::GetLinkUrl {
            key: "market".to_string(),
            params: params.clone(),
        };
        let b = Query::GetLinkUrl {
            key: "market".to_string(),
            params,
        };
        assert_eq!(a, b);
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn test_security_identity() {
        let a = Query::GetSystemsBySecurityRange {
            min: Security(0.0),
            max: Security(0.45),
        };
        let b = Query::GetSystemsBySecurityRange {
            min: Security(-0.0),
            max: Security::from(0.45),
        };
        assert_eq!(a, b);
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn test_args_use_camel_case() {
        assert_eq!(Query::GetType { type_id: 587 }.args(), json!({ "typeId": 587 }));
        let search = Query::SearchTypeByName {
            name: "Tritanium".to_string(),
            language: Language::En,
            limit: 20,
        };
        assert_eq!(search.command(), "search_type_by_name");
        assert_eq!(
            search.args(),
            json!({ "name": "Tritanium", "language": "en", "limit": 20 })
        );
        assert_eq!(
            Query::GetRegionsByFactionId { faction_id: None }.args(),
            json!({ "factionId": null })
        );
        assert_eq!(Query::GetFactionIds.args(), json!({}));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::GetType.api_name(), "getType");
        assert_eq!(Operation::GetNpcCorporationById.api_name(), "getNpcCorporationById");
        assert_eq!(Operation::GetLocalizationByLang.api_name(), "getLocalizationByLang");
        assert_eq!(Operation::GetUiLocalizationByLang.api_name(), "getUiLocalizationByLang");
        assert_eq!("getType".parse::<Operation>(), Ok(Operation::GetType));
        assert_eq!("get_type".parse::<Operation>(), Ok(Operation::GetType));
        assert_eq!(
            "getLocalizationByLang".parse::<Operation>(),
            Ok(Operation::GetLocalizationByLang)
        );
        assert_eq!(
            "get_localization_by_language".parse::<Operation>(),
            Ok(Operation::GetLocalizationByLang)
        );
        assert_eq!(
            "getMarketPrice".parse::<Operation>(),
            Err(CacheError::UnknownOperation("getMarketPrice".to_string()))
        );
        for op in Operation::ALL {
            assert_eq!(op.command().parse::<Operation>(), Ok(op));
            assert_eq!(op.api_name().parse::<Operation>(), Ok(op));
        }
    }

    fn sample(op: Operation) -> Query {
        let name = || "Jita".to_string();
        match op {
            Operation::GetGraphicPath => Query::GetGraphicPath {
                graphic_id: 1,
                graphic_type: GraphicType::Blueprint,
            },
            Operation::GetIconPath => Query::GetIconPath { icon_id: 1 },
            Operation::GetSkinMaterialPath => Query::GetSkinMaterialPath { skin_material_id: 1 },
            Operation::GetFactionIconPath => Query::GetFactionIconPath { icon_id: 1 },
            Operation::GetFactionLogoPath => Query::GetFactionLogoPath { logo_id: "amarr".to_string() },
            Operation::GetLocalization => Query::GetLocalization { key: 1 },
            Operation::GetLocalizationByLang => Query::GetLocalizationByLang {
                key: 1,
                language: Language::En,
            },
            Operation::GetUiLocalizationByLang => Query::GetUiLocalizationByLang {
                key: "market".to_string(),
                language: Language::Zh,
            },
            Operation::GetGroup => Query::GetGroup { group_id: 1 },
            Operation::GetCategory => Query::GetCategory { category_id: 1 },
            Operation::GetMetaGroup => Query::GetMetaGroup { meta_group_id: 1 },
            Operation::GetType => Query::GetType { type_id: 1 },
            Operation::SearchTypeByName => Query::SearchTypeByName {
                name: name(),
                language: Language::En,
                limit: 20,
            },
            Operation::SearchTypeByDescription => Query::SearchTypeByDescription {
                desc: name(),
                language: Language::En,
                limit: 20,
            },
            Operation::SearchRegionByName => Query::SearchRegionByName {
                name: name(),
                language: Language::En,
            },
            Operation::SearchConstellationByName => Query::SearchConstellationByName {
                name: name(),
                language: Language::En,
            },
            Operation::SearchSystemByName => Query::SearchSystemByName {
                name: name(),
                language: Language::En,
            },
            Operation::GetSkin => Query::GetSkin { skin_id: 1 },
            Operation::GetSkinMaterial => Query::GetSkinMaterial { skin_material_id: 1 },
            Operation::GetSkinLicense => Query::GetSkinLicense { license_id: 1 },
            Operation::GetSkinMaterialIdByLicense => Query::GetSkinMaterialIdByLicense { license_id: 1 },
            Operation::GetLicensesBySkin => Query::GetLicensesBySkin { skin_id: 1 },
            Operation::GetFaction => Query::GetFaction { faction_id: 1 },
            Operation::GetFactionIds => Query::GetFactionIds,
            Operation::GetMarketGroup => Query::GetMarketGroup { market_group_id: 1 },
            Operation::GetLinkUrl => Query::GetLinkUrl {
                key: "zkillboard".to_string(),
                params: BTreeMap::new(),
            },
            Operation::GetRegionById => Query::GetRegionById { region_id: 1 },
            Operation::GetRegionsByFactionId => Query::GetRegionsByFactionId { faction_id: Some(1) },
            Operation::GetRegionsByWormholeClassId => Query::GetRegionsByWormholeClassId { class_id: Some(1) },
            Operation::GetConstellationById => Query::GetConstellationById { constellation_id: 1 },
            Operation::GetConstellationsByRegionId => Query::GetConstellationsByRegionId { region_id: 1 },
            Operation::GetConstellationsByFactionId => Query::GetConstellationsByFactionId { faction_id: None },
            Operation::GetConstellationsByWormholeClassId => {
                Query::GetConstellationsByWormholeClassId { class_id: None }
            }
            Operation::GetSystemById => Query::GetSystemById { solar_system_id: 1 },
            Operation::GetSystemsByRegionId => Query::GetSystemsByRegionId { region_id: 1 },
            Operation::GetSystemsByConstellationId => Query::GetSystemsByConstellationId { constellation_id: 1 },
            Operation::GetSystemsByFactionId => Query::GetSystemsByFactionId { faction_id: Some(1) },
            Operation::GetSystemsByWormholeClassId => Query::GetSystemsByWormholeClassId { class_id: Some(1) },
            Operation::GetSystemsBySecurityRange => Query::GetSystemsBySecurityRange {
                min: Security(0.5),
                max: Security(1.0),
            },
            Operation::GetPlanetById => Query::GetPlanetById { planet_id: 1 },
            Operation::GetMoonById => Query::GetMoonById { moon_id: 1 },
            Operation::GetNpcStationById => Query::GetNpcStationById { station_id: 1 },
            Operation::GetNpcCorporationById => Query::GetNpcCorporationById { npc_corporation_id: 1 },
        }
    }

    #[test]
    fn test_bridge_contract() {
        // (operation, bridge command, argument keys) as the native layer declares them.
        let contract: [(Operation, &str, &[&str]); 43] = [
            (Operation::GetGraphicPath, "get_graphic_path", &["graphicId", "graphicType"]),
            (Operation::GetIconPath, "get_icon_path", &["iconId"]),
            (Operation::GetSkinMaterialPath, "get_skin_material_path", &["skinMaterialId"]),
            (Operation::GetFactionIconPath, "get_faction_icon_path", &["iconId"]),
            (Operation::GetFactionLogoPath, "get_faction_logo_path", &["logoId"]),
            (Operation::GetLocalization, "get_localization", &["key"]),
            (Operation::GetLocalizationByLang, "get_localization_by_language", &["key", "language"]),
            (Operation::GetUiLocalizationByLang, "get_ui_localization_by_language", &["key", "language"]),
            (Operation::GetGroup, "get_group", &["groupId"]),
            (Operation::GetCategory, "get_category", &["categoryId"]),
            (Operation::GetMetaGroup, "get_meta_group", &["metaGroupId"]),
            (Operation::GetType, "get_type", &["typeId"]),
            (Operation::SearchTypeByName, "search_type_by_name", &["name", "language", "limit"]),
            (Operation::SearchTypeByDescription, "search_type_by_description", &["desc", "language", "limit"]),
            (Operation::SearchRegionByName, "search_region_by_name", &["name", "language"]),
            (Operation::SearchConstellationByName, "search_constellation_by_name", &["name", "language"]),
            (Operation::SearchSystemByName, "search_system_by_name", &["name", "language"]),
            (Operation::GetSkin, "get_skin", &["skinId"]),
            (Operation::GetSkinMaterial, "get_skin_material", &["skinMaterialId"]),
            (Operation::GetSkinLicense, "get_skin_license", &["licenseId"]),
            (Operation::GetSkinMaterialIdByLicense, "get_skin_material_id_by_license", &["licenseId"]),
            (Operation::GetLicensesBySkin, "get_licenses_by_skin", &["skinId"]),
            (Operation::GetFaction, "get_faction", &["factionId"]),
            (Operation::GetFactionIds, "get_faction_ids", &[]),
            (Operation::GetMarketGroup, "get_market_group", &["marketGroupId"]),
            (Operation::GetLinkUrl, "get_link_url", &["key", "params"]),
            (Operation::GetRegionById, "get_region_by_id", &["regionId"]),
            (Operation::GetRegionsByFactionId, "get_regions_by_faction_id", &["factionId"]),
            (Operation::GetRegionsByWormholeClassId, "get_regions_by_wormhole_class_id", &["classId"]),
            (Operation::GetConstellationById, "get_constellation_by_id", &["constellationId"]),
            (Operation::GetConstellationsByRegionId, "get_constellations_by_region_id", &["regionId"]),
            (Operation::GetConstellationsByFactionId, "get_constellations_by_faction_id", &["factionId"]),
            (
                Operation::GetConstellationsByWormholeClassId,
                "get_constellations_by_wormhole_class_id",
                &["classId"],
            ),
            (Operation::GetSystemById, "get_system_by_id", &["solarSystemId"]),
            (Operation::GetSystemsByRegionId, "get_systems_by_region_id", &["regionId"]),
            (Operation::GetSystemsByConstellationId, "get_systems_by_constellation_id", &["constellationId"]),
            (Operation::GetSystemsByFactionId, "get_systems_by_faction_id", &["factionId"]),
            (Operation::GetSystemsByWormholeClassId, "get_systems_by_wormhole_class_id", &["classId"]),
            (Operation::GetSystemsBySecurityRange, "get_systems_by_security_range", &["min", "max"]),
            (Operation::GetPlanetById, "get_planet_by_id", &["planetId"]),
            (Operation::GetMoonById, "get_moon_by_id", &["moonId"]),
            (Operation::GetNpcStationById, "get_npc_station_by_id", &["stationId"]),
            (Operation::GetNpcCorporationById, "get_npc_corporation_by_id", &["npcCorporationId"]),
        ];

        let listed: Vec<Operation> = contract.iter().map(|(op, _, _)| *op).collect();
        assert_eq!(listed, Operation::ALL.to_vec());

        for (op, command, keys) in contract {
            let query = sample(op);
            assert_eq!(query.operation(), op);
            assert_eq!(op.command(), command, "{op:?}");
            assert_eq!(query.command(), command, "{op:?}");

            let args = query.args();
            let mut actual: Vec<&str> = args
                .as_object()
                .map(|map| map.keys().map(String::as_str).collect())
                .unwrap_or_default();
            let mut expected = keys.to_vec();
            actual.sort_unstable();
            expected.sort_unstable();
            assert_eq!(actual, expected, "{op:?}");

            // The serde tag has to agree with the command, or wire-built queries would not parse.
            assert_eq!(Query::from_wire(command, args), Ok(query), "{op:?}");
        }
    }

    #[test]
    fn test_renamed_bridge_arguments() {
        assert_eq!(
            Query::GetNpcCorporationById { npc_corporation_id: 1000002 }.args(),
            json!({ "npcCorporationId": 1000002 })
        );
        assert_eq!(
            Query::GetLocalizationByLang {
                key: 7,
                language: Language::En,
            }
            .command(),
            "get_localization_by_language"
        );
        assert_eq!(
            Query::GetGraphicPath {
                graphic_id: 10,
                graphic_type: GraphicType::BlueprintCopy,
            }
            .args(),
            json!({ "graphicId": 10, "graphicType": 2 })
        );
        assert_eq!(
            Query::GetFactionLogoPath { logo_id: "amarr".to_string() }.args(),
            json!({ "logoId": "amarr" })
        );
        assert!(matches!(
            Query::from_wire("get_graphic_path", json!({ "graphicId": 10, "graphicType": 9 })),
            Err(CacheError::MalformedParams { .. })
        ));
    }

    #[test]
    fn test_from_wire() {
        assert_eq!(
            Query::from_wire("getType", json!({ "typeId": 587 })),
            Ok(Query::GetType { type_id: 587 })
        );
        assert_eq!(Query::from_wire("get_faction_ids", json!({})), Ok(Query::GetFactionIds));
        assert_eq!(Query::from_wire("get_faction_ids", Value::Null), Ok(Query::GetFactionIds));
        assert!(matches!(
            Query::from_wire("getType", json!({ "typeId": "abc" })),
            Err(CacheError::MalformedParams { .. })
        ));
        assert_eq!(
            Query::from_wire("dropTables", json!({})),
            Err(CacheError::UnknownOperation("dropTables".to_string()))
        );
    }

    #[test]
    fn test_wire_round_trip_keeps_identity() {
        let query = Query::GetLocalizationByLang {
            key: 12,
            language: Language::Zh,
        };
        let rebuilt = Query::from_wire(query.command(), query.args()).unwrap();
        assert_eq!(rebuilt, query);
    }
}
