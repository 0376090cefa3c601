//! Static tips used when the tip function cannot be reached.

use super::TipType;
use crate::models::HairSubtype;

/// Subtype used when the profile's hair type is not one we have tips for.
pub const DEFAULT_SUBTYPE: HairSubtype = HairSubtype::FourC;

// Every subtype has a `General` entry; other types are optional.
const TABLE: &[(HairSubtype, TipType, &str)] = &[
    (
        HairSubtype::ThreeC,
        TipType::General,
        "Vos boucles serrées aiment l'eau : réhydratez-les avec une brume légère entre deux lavages.",
    ),
    (
        HairSubtype::ThreeC,
        TipType::Routine,
        "Lavez en deux temps : co-wash en milieu de semaine, shampoing doux le week-end.",
    ),
    (
        HairSubtype::ThreeC,
        TipType::Styling,
        "Appliquez votre gel sur cheveux trempés et laissez sécher sans toucher pour des boucles définies.",
    ),
    (
        HairSubtype::FourA,
        TipType::General,
        "Vos spirales sont fragiles aux pointes : scellez-les chaque soir avec une huile légère.",
    ),
    (
        HairSubtype::FourA,
        TipType::Product,
        "Privilégiez les crèmes riches en glycérine végétale et en aloe vera pour garder le ressort.",
    ),
    (
        HairSubtype::FourA,
        TipType::Seasonal,
        "Par temps sec, ajoutez un masque hydratant de plus chaque semaine.",
    ),
    (
        HairSubtype::FourB,
        TipType::General,
        "Démêlez toujours sur cheveux mouillés et enduits de soin, en commençant par les pointes.",
    ),
    (
        HairSubtype::FourB,
        TipType::Routine,
        "Adoptez la méthode LOC : leave-in, huile, puis crème pour une hydratation durable.",
    ),
    (
        HairSubtype::FourB,
        TipType::Styling,
        "Les twists de deux jours préservent la longueur et donnent un twist-out bien défini.",
    ),
    (
        HairSubtype::FourC,
        TipType::General,
        "Les cheveux 4C perdent vite leur eau : hydratez, scellez au beurre de karité et protégez la nuit.",
    ),
    (
        HairSubtype::FourC,
        TipType::Routine,
        "Un bain d'huile tiède avant chaque shampoing limite la casse lors du lavage.",
    ),
    (
        HairSubtype::FourC,
        TipType::Product,
        "Cherchez des beurres (karité, mangue) et des huiles scellantes comme le ricin en fin de routine.",
    ),
    (
        HairSubtype::FourC,
        TipType::Seasonal,
        "En hiver, gardez vos pointes à l'abri du froid et des écharpes en laine grâce aux coiffures protectrices.",
    ),
    (
        HairSubtype::FourC,
        TipType::Styling,
        "Étirez vos cheveux sans chaleur avec des bantu knots ou des tresses avant de les coiffer.",
    ),
];

/// Fallback tip for a profile's free-text hair type and a requested tip type.
pub fn fallback_tip(hair_type: &str, tip_type: TipType) -> &'static str {
    let subtype = HairSubtype::parse(hair_type).unwrap_or(DEFAULT_SUBTYPE);
    lookup(subtype, tip_type)
        .or_else(|| lookup(subtype, TipType::General))
        .unwrap_or(GENERAL_LAST_RESORT)
}

const GENERAL_LAST_RESORT: &str =
    "Hydratez vos cheveux régulièrement et protégez vos pointes la nuit avec un bonnet en satin.";

fn lookup(subtype: HairSubtype, tip_type: TipType) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(candidate, kind, _)| *candidate == subtype && *kind == tip_type)
        .map(|(_, _, tip)| *tip)
}
