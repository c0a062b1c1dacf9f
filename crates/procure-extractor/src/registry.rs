//! Field mapping registry
//!
//! Declarative tables mapping a row label to an output field. Each
//! [`SectionSpec`] also names the elements its rows live in and the
//! layout the walker uses to group them, so the walker itself holds no
//! per-section knowledge.

use crate::config::ExtractorConfig;
use crate::convert::Conversion;
use crate::error::ExtractorError;
use indexmap::IndexMap;
use procure_domain::{DocumentVariant, Section};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

static TENDERER_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^投標廠商(\d+)$").unwrap());
static ITEM_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^第(\d+)品項$").unwrap());
static VENDOR_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^得標廠商(\d+)$").unwrap());

/// Label of the row carrying the treaty-applicability trio
pub const TREATY_LABEL: &str = "是否適用條約或協定之採購";

/// Label of the row carrying the executing organization id and name
pub const EXECUTING_ORG_LABEL: &str = "履約執行機關";

/// Special handler for a row that encodes several fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverId {
    /// `(GPA)：是 … (ANZTEC)：否 … (ASTEP)：是`
    TreatyTrio,
    /// `機關代碼：<id> … 機關名稱：<name>`
    ExecutingOrganization,
}

impl ResolverId {
    /// Fields written by the resolver, all or none
    pub fn output_keys(self) -> &'static [&'static str] {
        match self {
            ResolverId::TreatyTrio => &["is_gpa", "is_anztec", "is_astep"],
            ResolverId::ExecutingOrganization => &["executing_org_id", "executing_org_name"],
        }
    }
}

/// How a labeled row becomes output fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// One label, one output field
    Direct {
        /// Output field name
        key: &'static str,
        /// Conversion applied to the value cell
        conversion: Conversion,
    },
    /// One label, several output fields
    Composite(ResolverId),
}

/// Row grouping used by a section
#[derive(Debug, Clone, Copy)]
pub enum SectionLayout {
    /// One record per document
    Flat,
    /// Marker rows `N` start group `N`; rows until the next marker map into it
    Grouped {
        /// Pattern of the group marker label, capturing the ordinal
        marker: &'static Regex,
        /// Field holding the ordinal in every group record
        sequence_key: &'static str,
    },
    /// Item headers with vendor sub-groups beneath them
    Nested {
        /// Item header pattern
        item_marker: &'static Regex,
        /// Vendor sub-header pattern
        vendor_marker: &'static Regex,
        /// Field holding the item ordinal
        item_key: &'static str,
        /// Field holding the vendor ordinal
        vendor_key: &'static str,
        /// Fields captured under an item header and copied into its vendors
        carry: &'static [&'static str],
    },
    /// Unlabeled cells in fixed-width groups, mapped by position
    FlatList {
        /// Cells per record
        width: usize,
    },
}

/// Everything the walker needs to read one section
#[derive(Debug, Clone)]
pub struct SectionSpec {
    /// Bundle slot the section fills
    pub section: Section,
    /// Elements holding the section's rows (or cells, for a flat list)
    pub selector: Selector,
    /// Row grouping
    pub layout: SectionLayout,
    fields: IndexMap<&'static str, FieldRule>,
}

impl SectionSpec {
    fn new(
        section: Section,
        selector: &str,
        layout: SectionLayout,
        fields: IndexMap<&'static str, FieldRule>,
    ) -> Result<Self, ExtractorError> {
        let selector = Selector::parse(selector)
            .map_err(|e| ExtractorError::Selector(format!("{}: {}", selector, e)))?;
        Ok(Self {
            section,
            selector,
            layout,
            fields,
        })
    }

    /// Rule for a whitespace-free label, `None` if the label is unmapped
    pub fn rule(&self, label: &str) -> Option<&FieldRule> {
        self.fields.get(label)
    }

    /// Labels and rules in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldRule)> {
        self.fields.iter().map(|(label, rule)| (*label, rule))
    }

    /// Whether an output field is carried from an item header to its vendors
    pub fn is_carry(&self, key: &str) -> bool {
        match self.layout {
            SectionLayout::Nested { carry, .. } => carry.contains(&key),
            _ => false,
        }
    }
}

/// The section specs for one document variant
#[derive(Debug, Clone)]
pub struct RegistrySet {
    /// Variant this set reads
    pub variant: DocumentVariant,
    /// Sections in document order
    pub sections: Vec<SectionSpec>,
}

impl RegistrySet {
    /// Registry for award notices
    pub fn award(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let sections = vec![
            SectionSpec::new(
                Section::Organization,
                "tr.award_table_tr_1",
                SectionLayout::Flat,
                organization_fields(false),
            )?,
            SectionSpec::new(
                Section::Procurement,
                "tr.award_table_tr_2",
                SectionLayout::Flat,
                award_procurement_fields(),
            )?,
            SectionSpec::new(
                Section::Tenderer,
                "tr.award_table_tr_3",
                SectionLayout::Grouped {
                    marker: &TENDERER_MARKER,
                    sequence_key: "tenderer_sequence",
                },
                tenderer_fields(),
            )?,
            SectionSpec::new(
                Section::AwardItem,
                "tr.award_table_tr_4",
                SectionLayout::Nested {
                    item_marker: &ITEM_MARKER,
                    vendor_marker: &VENDOR_MARKER,
                    item_key: "item_sequence",
                    vendor_key: "tenderer_sequence",
                    carry: &["item_name", "unit", "is_unit_price"],
                },
                award_item_fields(),
            )?,
            SectionSpec::new(
                Section::Committee,
                "td#mat_venderArguTd",
                SectionLayout::FlatList { width: 4 },
                committee_fields(),
            )?,
            SectionSpec::new(
                Section::Award,
                "tr.award_table_tr_6",
                SectionLayout::Flat,
                award_fields(config),
            )?,
        ];
        Ok(Self {
            variant: DocumentVariant::Award,
            sections,
        })
    }

    /// Registry for tender declaration notices
    pub fn declaration() -> Result<Self, ExtractorError> {
        let sections = vec![
            SectionSpec::new(
                Section::Organization,
                "tr.tender_table_tr_1",
                SectionLayout::Flat,
                organization_fields(true),
            )?,
            SectionSpec::new(
                Section::Procurement,
                "tr.tender_table_tr_2",
                SectionLayout::Flat,
                declaration_procurement_fields(),
            )?,
            SectionSpec::new(
                Section::Declaration,
                "tr.tender_table_tr_3",
                SectionLayout::Flat,
                declaration_fields(),
            )?,
            SectionSpec::new(
                Section::Attendance,
                "tr.tender_table_tr_4",
                SectionLayout::Flat,
                attendance_fields(),
            )?,
            SectionSpec::new(
                Section::Other,
                "tr.tender_table_tr_5",
                SectionLayout::Flat,
                other_fields(),
            )?,
        ];
        Ok(Self {
            variant: DocumentVariant::Declaration,
            sections,
        })
    }

    /// Registry for a variant
    pub fn for_variant(
        variant: DocumentVariant,
        config: &ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        match variant {
            DocumentVariant::Award => Self::award(config),
            DocumentVariant::Declaration => Self::declaration(),
        }
    }

    /// Spec for one section, if the variant has it
    pub fn section(&self, section: Section) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.section == section)
    }
}

fn direct(key: &'static str, conversion: Conversion) -> FieldRule {
    FieldRule::Direct { key, conversion }
}

fn table<const N: usize>(entries: [(&'static str, FieldRule); N]) -> IndexMap<&'static str, FieldRule> {
    entries.into_iter().collect()
}

use Conversion::{Date, Integer, Money, Phone, RemoveSpace, Strip, Unescape, YesNo};

fn organization_fields(with_email: bool) -> IndexMap<&'static str, FieldRule> {
    let mut fields = table([
        ("機關代碼", direct("org_id", RemoveSpace)),
        ("機關名稱", direct("org_name", RemoveSpace)),
        ("單位名稱", direct("unit_name", RemoveSpace)),
        ("機關地址", direct("address", RemoveSpace)),
        ("聯絡人", direct("contact_name", Strip)),
        ("聯絡電話", direct("phone", Phone)),
        ("傳真號碼", direct("fax", Phone)),
    ]);
    if with_email {
        fields.insert("電子郵件信箱", direct("email", RemoveSpace));
    }
    fields
}

fn award_procurement_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("標案案號", direct("case_number", RemoveSpace)),
        ("招標方式", direct("procurement_type", RemoveSpace)),
        ("決標方式", direct("awarding_type", RemoveSpace)),
        ("是否依政府採購法施行細則第64條之2辦理", direct("is_follow_law_64_2", YesNo)),
        ("新增公告傳輸次數", direct("num_transmit", Integer)),
        ("是否依據採購法第106條第1項第1款辦理", direct("is_follow_law_106_1_1", YesNo)),
        ("標案名稱", direct("subject", RemoveSpace)),
        ("決標資料類別", direct("awarding_category", RemoveSpace)),
        ("是否屬共同供應契約採購", direct("is_inter_entity_supply_contract", YesNo)),
        (
            "是否屬二以上機關之聯合採購(不適用共同供應契約規定)",
            direct("is_joint_procurement", YesNo),
        ),
        ("是否複數決標", direct("is_multiple_award", YesNo)),
        ("是否共同投標", direct("is_joint_tender", YesNo)),
        ("標的分類", direct("classification", Unescape)),
        ("是否屬統包", direct("is_design_build_contract", YesNo)),
        (
            "是否應依公共工程專業技師簽證規則實施技師簽證",
            direct("is_engineer_certification_required", YesNo),
        ),
        ("開標時間", direct("opening_date", Date)),
        ("原公告日期", direct("original_publication_date", Date)),
        ("採購金額級距", direct("procurement_amount_level", RemoveSpace)),
        ("辦理方式", direct("conduct_procurement", RemoveSpace)),
        (TREATY_LABEL, FieldRule::Composite(ResolverId::TreatyTrio)),
        ("預算金額是否公開", direct("is_budget_amount_public", YesNo)),
        ("預算金額", direct("budget_amount", Money)),
        ("是否受機關補助", direct("is_org_subsidy", YesNo)),
        ("履約地點", direct("fulfill_location", Strip)),
        ("履約地點（含地區）", direct("fulfill_location_district", Strip)),
        ("是否含特別預算", direct("is_special_budget", YesNo)),
        ("歸屬計畫類別", direct("project_type", RemoveSpace)),
        (
            "本案採購契約是否採用主管機關訂定之範本",
            direct("is_authorities_template", YesNo),
        ),
    ])
}

fn tenderer_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("廠商代碼", direct("tenderer_code", RemoveSpace)),
        ("廠商名稱", direct("tenderer_name", RemoveSpace)),
        ("是否得標", direct("is_awarded", YesNo)),
        ("組織型態", direct("organization_type", RemoveSpace)),
        ("廠商地址", direct("address", RemoveSpace)),
        ("廠商電話", direct("phone", Phone)),
        ("決標金額", direct("award_price", Money)),
        ("是否為中小企業", direct("is_sme", YesNo)),
        ("僱用員工總人數是否超過100人", direct("is_over_100_employees", YesNo)),
        ("僱用員工總人數", direct("employee_count", Integer)),
        ("已僱用原住民人數", direct("indigenous_employee_count", Integer)),
        ("已僱用身心障礙者人數", direct("disabled_employee_count", Integer)),
    ])
}

fn award_item_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("品項名稱", direct("item_name", RemoveSpace)),
        ("單位", direct("unit", RemoveSpace)),
        ("是否以單價決標", direct("is_unit_price", YesNo)),
        ("得標廠商", direct("awarded_tenderer", RemoveSpace)),
        ("預估需求數量", direct("request_quantity", Integer)),
        ("決標金額", direct("award_price", Money)),
        ("底價金額", direct("base_price", Money)),
        ("原產地國別", direct("source_country", RemoveSpace)),
        ("原產地國別得標金額", direct("source_country_award_price", Money)),
    ])
}

/// Committee columns, positional
fn committee_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("項次", direct("sequence", Integer)),
        ("出席會議", direct("attended", YesNo)),
        ("姓名", direct("name", RemoveSpace)),
        ("職業", direct("occupation", RemoveSpace)),
    ])
}

fn award_fields(config: &ExtractorConfig) -> IndexMap<&'static str, FieldRule> {
    table([
        ("決標公告序號", direct("award_announcement_sequence", RemoveSpace)),
        ("決標日期", direct("award_date", Date)),
        ("決標公告日期", direct("award_announcement_date", Date)),
        ("是否刊登公報", direct("is_post_bulletin", YesNo)),
        ("底價金額", direct("base_price", Money)),
        ("底價金額是否公開", direct("is_base_price_public", YesNo)),
        // Converter chosen in configuration: historical extractors disagree
        // between money and date for this one field.
        (
            "總決標金額",
            direct("total_award_price", config.total_award_price_conversion.conversion()),
        ),
        ("總決標金額是否公開", direct("is_total_award_price_public", YesNo)),
        (
            "契約是否訂有依物價指數調整價金規定",
            direct("is_price_dynamic_with_cpi", YesNo),
        ),
        ("未列物價調整規定說明", direct("no_price_dynamic_description", RemoveSpace)),
        (EXECUTING_ORG_LABEL, FieldRule::Composite(ResolverId::ExecutingOrganization)),
        ("附加說明", direct("additional_info", Strip)),
    ])
}

fn declaration_procurement_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("標案案號", direct("case_number", RemoveSpace)),
        ("標案名稱", direct("subject", RemoveSpace)),
        ("標的分類", direct("classification", Unescape)),
        ("工程計畫編號", direct("project_no", Strip)),
        ("本採購案是否屬於建築工程", direct("is_construction", YesNo)),
        ("財物採購性質", direct("goods_category", Strip)),
        ("採購金額級距", direct("procurement_amount_level", RemoveSpace)),
        ("辦理方式", direct("conduct_procurement", RemoveSpace)),
        ("依據法條", direct("apply_law", RemoveSpace)),
        (TREATY_LABEL, FieldRule::Composite(ResolverId::TreatyTrio)),
        ("預算金額", direct("budget_amount", Money)),
        ("預算金額是否公開", direct("is_budget_amount_public", YesNo)),
        ("後續擴充", direct("is_extension", YesNo)),
        ("是否受機關補助", direct("is_org_subsidy", YesNo)),
        ("是否含特別預算", direct("is_special_budget", YesNo)),
    ])
}

fn declaration_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("招標方式", direct("procurement_type", RemoveSpace)),
        ("決標方式", direct("awarding_type", RemoveSpace)),
        ("是否依政府採購法施行細則第64條之2辦理", direct("is_follow_law_64_2", YesNo)),
        ("是否電子報價", direct("is_electronic_quote", YesNo)),
        ("新增公告傳輸次數", direct("num_transmit", Integer)),
        ("招標狀態", direct("procurement_status", Strip)),
        ("公告日", direct("publication_date", Date)),
        ("是否複數決標", direct("is_multiple_award", YesNo)),
        ("是否訂有底價", direct("has_base_price", YesNo)),
        ("是否屬特殊採購", direct("is_special", YesNo)),
        ("是否已辦理公開閱覽", direct("is_public_view", YesNo)),
        ("是否屬統包", direct("is_design_build_contract", YesNo)),
        ("是否屬共同供應契約採購", direct("is_inter_entity_supply_contract", YesNo)),
        (
            "是否屬二以上機關之聯合採購(不適用共同供應契約規定)",
            direct("is_joint_procurement", YesNo),
        ),
        (
            "是否應依公共工程專業技師簽證規則實施技師簽證",
            direct("is_engineer_certification_required", YesNo),
        ),
        ("是否採行協商措施", direct("is_negotiation", YesNo)),
        (
            "是否適用採購法第104條或105條或招標期限標準第10條或第4條之1",
            direct("is_follow_law_104_105", YesNo),
        ),
        ("是否依據採購法第106條第1項第1款辦理", direct("is_follow_law_106_1_1", YesNo)),
    ])
}

fn attendance_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("是否提供電子領標", direct("is_electronic_receive", YesNo)),
        ("是否提供電子投標", direct("is_electronic_submit", YesNo)),
        ("截止投標", direct("submit_deadline", Date)),
        ("開標時間", direct("opening_date", Date)),
        ("開標地點", direct("opening_address", Strip)),
        ("是否須繳納押標金", direct("is_tender_bond", YesNo)),
        ("投標文字", direct("submit_language", RemoveSpace)),
        ("收受投標文件地點", direct("submit_address", Strip)),
    ])
}

fn other_fields() -> IndexMap<&'static str, FieldRule> {
    table([
        ("是否依據採購法第99條", direct("is_follow_law_99", YesNo)),
        ("履約地點", direct("fulfill_location", Strip)),
        ("履約期限", direct("fulfill_deadline", RemoveSpace)),
        ("是否刊登公報", direct("is_post_bulletin", YesNo)),
        (
            "本案採購契約是否採用主管機關訂定之範本",
            direct("is_authorities_template", YesNo),
        ),
        ("歸屬計畫類別", direct("project_type", RemoveSpace)),
        ("廠商資格摘要", direct("qualification_summary", Strip)),
        ("是否訂有與履約能力有關之基本資格", direct("is_qualify_fulfill", YesNo)),
    ])
}
