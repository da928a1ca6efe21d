//! The ready-made reports of the treasury desk. Every template lays out its sections in a
//! fixed order from the figures it is given and returns the finished PDF file.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

use crate::document::DocumentConfig;
use crate::error::ContextError;
use crate::formatting::FormattingPolicy;
use crate::report::{ReportBuilder, ReportOptions};
use crate::sections::{KeyValue, Signatories, SummaryItem, Trend};
use crate::table::{ReportTable, Row, TableColumn};

/// A generated PDF report and the name it is meant to be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl RenderedReport {
    /// Writes the report into the directory under its own file name and returns the path written to.
    pub fn save_in<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, ContextError> {
        let path = directory.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|error| {
            ContextError::with_error(format!("Unable to write the report to {:?}", path), &error)
        })?;

        Ok(path)
    }
}

/// The file name of a report: the title followed by the period, every run of whitespace
/// replaced by an underscore, with a single `.pdf` extension.
pub fn report_filename(title: &str, period: Option<&str>) -> String {
    let mut words: Vec<&str> = title.split_whitespace().collect();
    if let Some(period) = period {
        words.extend(period.split_whitespace());
    }
    let stem = words.join("_");
    let stem = match strip_extension(&stem, "pdf") {
        "" => "report",
        stem => stem,
    };

    format!("{stem}.pdf")
}

/// Removes a trailing extension, matched without regard to case.
pub(crate) fn strip_extension<'a>(stem: &'a str, extension: &str) -> &'a str {
    let suffix_length = extension.len() + 1;
    if stem.len() >= suffix_length && stem.is_char_boundary(stem.len() - suffix_length) {
        let (rest, suffix) = stem.split_at(stem.len() - suffix_length);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            return rest;
        }
    }
    stem
}

fn finish(mut builder: ReportBuilder, period: Option<&str>) -> Result<RenderedReport, ContextError> {
    builder.finalize()?;
    let page_count = builder.page_state().page_number();
    let filename = report_filename(&builder.config().title, period);
    let bytes = builder.get_bytes()?;
    log::debug!("Rendered {:?} with {} pages", filename, page_count);

    Ok(RenderedReport {
        filename,
        bytes,
        page_count,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxDeal {
    pub reference: String,
    pub currency_pair: String,
    pub direction: String,
    pub amount: f64,
    pub currency: String,
    pub rate: f64,
    pub counterparty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub counterparty: String,
    pub instrument: String,
    pub principal: f64,
    pub currency: String,
    pub rate_percent: f64,
    pub tenor_days: u32,
}

/// Figures of the monthly management information summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MisReportData {
    pub period: String,
    pub prepared_by: String,
    pub reporting_currency: String,
    pub fx_volume: f64,
    pub fx_volume_change_percent: f64,
    pub net_interest_income: f64,
    pub net_interest_income_change_percent: f64,
    pub liquidity_ratio_percent: f64,
    pub open_positions: u32,
    pub fx_deals: Vec<FxDeal>,
    pub placements: Vec<Placement>,
    pub commentary: String,
}

impl MisReportData {
    /// Illustrative figures for demonstrating the report.
    pub fn sample(period: &str) -> Self {
        MisReportData {
            period: period.into(),
            prepared_by: "Treasury Front Office".into(),
            reporting_currency: "NGN".into(),
            fx_volume: 48_750_000_000.0,
            fx_volume_change_percent: 12.4,
            net_interest_income: 2_315_400_000.0,
            net_interest_income_change_percent: -3.2,
            liquidity_ratio_percent: 42.7,
            open_positions: 18,
            fx_deals: vec![
                FxDeal {
                    reference: "FX-2026-0142".into(),
                    currency_pair: "USD/NGN".into(),
                    direction: "Buy".into(),
                    amount: 2_500_000.0,
                    currency: "USD".into(),
                    rate: 1_547.25,
                    counterparty: "Zenith Bank".into(),
                },
                FxDeal {
                    reference: "FX-2026-0143".into(),
                    currency_pair: "EUR/NGN".into(),
                    direction: "Sell".into(),
                    amount: 850_000.0,
                    currency: "EUR".into(),
                    rate: 1_683.10,
                    counterparty: "Access Bank".into(),
                },
                FxDeal {
                    reference: "FX-2026-0151".into(),
                    currency_pair: "GBP/NGN".into(),
                    direction: "Buy".into(),
                    amount: 400_000.0,
                    currency: "GBP".into(),
                    rate: 1_962.40,
                    counterparty: "First Bank".into(),
                },
                FxDeal {
                    reference: "FX-2026-0158".into(),
                    currency_pair: "USD/NGN".into(),
                    direction: "Sell".into(),
                    amount: 1_200_000.0,
                    currency: "USD".into(),
                    rate: 1_551.80,
                    counterparty: "GTBank".into(),
                },
            ],
            placements: vec![
                Placement {
                    counterparty: "Stanbic IBTC".into(),
                    instrument: "Call Placement".into(),
                    principal: 5_000_000_000.0,
                    currency: "NGN".into(),
                    rate_percent: 26.5,
                    tenor_days: 1,
                },
                Placement {
                    counterparty: "UBA".into(),
                    instrument: "Fixed Deposit".into(),
                    principal: 3_500_000_000.0,
                    currency: "NGN".into(),
                    rate_percent: 24.0,
                    tenor_days: 90,
                },
                Placement {
                    counterparty: "Federal Government".into(),
                    instrument: "Treasury Bill".into(),
                    principal: 10_000_000_000.0,
                    currency: "NGN".into(),
                    rate_percent: 21.75,
                    tenor_days: 182,
                },
            ],
            commentary: "FX volumes rose on the back of increased corporate demand ahead of \
                the quarter end, while net interest income eased as placement rates softened. \
                Liquidity remained comfortably above the regulatory minimum throughout the period."
                .into(),
        }
    }
}

fn trend_of(change_percent: f64) -> Trend {
    if change_percent > 0.0 {
        Trend::Up
    } else if change_percent < 0.0 {
        Trend::Down
    } else {
        Trend::Neutral
    }
}

fn signed_percentage(formatting: &dyn FormattingPolicy, change_percent: f64) -> String {
    let formatted = formatting.format_percentage(change_percent);
    if change_percent > 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

fn in_millions(formatting: &dyn FormattingPolicy, amount: f64, currency: &str) -> String {
    format!("{}m", formatting.format(amount / 1_000_000.0, currency))
}

/// The monthly management information summary of the treasury desk.
pub fn mis_report(
    data: &MisReportData,
    options: &ReportOptions,
    formatting: &dyn FormattingPolicy,
) -> Result<RenderedReport, ContextError> {
    let currency = data.reporting_currency.as_str();
    let config = DocumentConfig::new("MIS Report")
        .with_subtitle("Management Information Summary")
        .with_period(data.period.clone())
        .with_department("Treasury")
        .with_generated_by(data.prepared_by.clone());
    let mut builder = ReportBuilder::generate(config, options)?;

    builder
        .add_section_title("Key Indicators")?
        .add_summary_cards(&[
            SummaryItem::new("FX Volume", in_millions(formatting, data.fx_volume, currency))
                .with_trend(
                    trend_of(data.fx_volume_change_percent),
                    signed_percentage(formatting, data.fx_volume_change_percent),
                ),
            SummaryItem::new(
                "Net Interest Income",
                in_millions(formatting, data.net_interest_income, currency),
            )
            .with_trend(
                trend_of(data.net_interest_income_change_percent),
                signed_percentage(formatting, data.net_interest_income_change_percent),
            ),
            SummaryItem::new(
                "Liquidity Ratio",
                formatting.format_percentage(data.liquidity_ratio_percent),
            ),
            SummaryItem::new("Open Positions", data.open_positions),
        ])?;

    let fx_deals = ReportTable::new(
        "FX Deals",
        vec![
            TableColumn::new("Reference", "reference").with_width(30.0),
            TableColumn::new("Pair", "pair"),
            TableColumn::new("Direction", "direction"),
            TableColumn::new("Amount", "amount"),
            TableColumn::new("Rate", "rate"),
            TableColumn::new("Counterparty", "counterparty"),
        ],
        data.fx_deals
            .iter()
            .map(|deal| {
                Row::new()
                    .with("reference", deal.reference.as_str())
                    .with("pair", deal.currency_pair.as_str())
                    .with("direction", deal.direction.as_str())
                    .with("amount", formatting.format(deal.amount, &deal.currency))
                    .with("rate", format!("{:.2}", deal.rate))
                    .with("counterparty", deal.counterparty.as_str())
            })
            .collect(),
    );
    let placements = ReportTable::new(
        "Money Market Placements",
        vec![
            TableColumn::new("Counterparty", "counterparty"),
            TableColumn::new("Instrument", "instrument"),
            TableColumn::new("Principal", "principal"),
            TableColumn::new("Rate", "rate"),
            TableColumn::new("Tenor (days)", "tenor"),
        ],
        data.placements
            .iter()
            .map(|placement| {
                Row::new()
                    .with("counterparty", placement.counterparty.as_str())
                    .with("instrument", placement.instrument.as_str())
                    .with(
                        "principal",
                        formatting.format(placement.principal, &placement.currency),
                    )
                    .with("rate", formatting.format_percentage(placement.rate_percent))
                    .with("tenor", placement.tenor_days)
            })
            .collect(),
    );

    builder
        .add_section_title("Trading Activity")?
        .add_report_table(&fx_deals)?
        .add_report_table(&placements)?
        .add_section_title("Commentary")?
        .add_paragraph(&data.commentary)?
        .add_signature_block(&Signatories {
            prepared_by: Some(data.prepared_by.clone()),
            approved_by: None,
        })?;

    finish(builder, Some(&data.period))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub requirement: String,
    pub threshold: String,
    pub actual: String,
    pub compliant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceBreach {
    pub date: String,
    pub description: String,
    pub remediation: String,
}

/// Figures of the regulatory compliance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryComplianceData {
    pub period: String,
    pub institution: String,
    pub compliance_officer: String,
    pub checks: Vec<ComplianceCheck>,
    pub breaches: Vec<ComplianceBreach>,
    pub attestation: String,
}

impl RegulatoryComplianceData {
    /// Illustrative figures for demonstrating the report.
    pub fn sample(period: &str) -> Self {
        let check = |requirement: &str, threshold: &str, actual: &str, compliant: bool| {
            ComplianceCheck {
                requirement: requirement.into(),
                threshold: threshold.into(),
                actual: actual.into(),
                compliant,
            }
        };
        RegulatoryComplianceData {
            period: period.into(),
            institution: "Example Bank Plc".into(),
            compliance_officer: "Head, Regulatory Compliance".into(),
            checks: vec![
                check("Liquidity Ratio", ">= 30.00%", "42.70%", true),
                check("Capital Adequacy Ratio", ">= 15.00%", "18.40%", true),
                check("Net Open Position", "<= 20.00% of SHF", "14.90%", true),
                check("Cash Reserve Ratio", "50.00%", "50.00%", true),
                check("Loan to Deposit Ratio", ">= 50.00%", "48.20%", false),
            ],
            breaches: vec![ComplianceBreach {
                date: "14 Jan 2026".into(),
                description: "Loan to deposit ratio below the minimum at month end".into(),
                remediation: "Lending pipeline accelerated, position to be restored by February".into(),
            }],
            attestation: "We confirm that the figures in this report have been prepared from the \
                books of the bank and reflect its position as at the end of the period."
                .into(),
        }
    }
}

/// The summary of the regulatory ratios and of any breach during the period.
pub fn regulatory_compliance_report(
    data: &RegulatoryComplianceData,
    options: &ReportOptions,
    formatting: &dyn FormattingPolicy,
) -> Result<RenderedReport, ContextError> {
    let compliant_count = data.checks.iter().filter(|check| check.compliant).count();
    let compliance_rate = if data.checks.is_empty() {
        100.0
    } else {
        compliant_count as f64 * 100.0 / data.checks.len() as f64
    };

    let config = DocumentConfig::new("Regulatory Compliance Report")
        .with_subtitle("Prudential Ratios and Breaches")
        .with_period(data.period.clone())
        .with_department("Risk and Compliance")
        .with_generated_by(data.compliance_officer.clone());
    let mut builder = ReportBuilder::generate(config, options)?;

    builder
        .add_key_values(&[
            KeyValue::new("Institution", data.institution.as_str()),
            KeyValue::new("Reporting Period", data.period.as_str()),
            KeyValue::new("Compliance Officer", data.compliance_officer.as_str()),
        ])?
        .add_section_title("Compliance Overview")?
        .add_summary_cards(&[
            SummaryItem::new("Requirements Checked", data.checks.len() as u32),
            SummaryItem::new("Compliant", compliant_count as u32),
            SummaryItem::new("Breaches", data.breaches.len() as u32).with_trend(
                if data.breaches.is_empty() {
                    Trend::Neutral
                } else {
                    Trend::Down
                },
                format!("{} open", data.breaches.len()),
            ),
            SummaryItem::new("Compliance Rate", formatting.format_percentage(compliance_rate)),
        ])?;

    let checks = ReportTable::new(
        "Prudential Requirements",
        vec![
            TableColumn::new("Requirement", "requirement"),
            TableColumn::new("Threshold", "threshold"),
            TableColumn::new("Actual", "actual"),
            TableColumn::new("Status", "status").with_width(25.0),
        ],
        data.checks
            .iter()
            .map(|check| {
                Row::new()
                    .with("requirement", check.requirement.as_str())
                    .with("threshold", check.threshold.as_str())
                    .with("actual", check.actual.as_str())
                    .with(
                        "status",
                        if check.compliant {
                            "Compliant"
                        } else {
                            "Breach"
                        },
                    )
            })
            .collect(),
    );
    builder.add_report_table(&checks)?;

    if data.breaches.is_empty() {
        builder.add_paragraph("No breach was recorded during the period.")?;
    } else {
        let breaches = ReportTable::new(
            "Breaches",
            vec![
                TableColumn::new("Date", "date").with_width(28.0),
                TableColumn::new("Description", "description"),
                TableColumn::new("Remediation", "remediation"),
            ],
            data.breaches
                .iter()
                .map(|breach| {
                    Row::new()
                        .with("date", breach.date.as_str())
                        .with("description", breach.description.as_str())
                        .with("remediation", breach.remediation.as_str())
                })
                .collect(),
        );
        builder.add_report_table(&breaches)?;
    }

    builder
        .add_section_title("Attestation")?
        .add_paragraph(&data.attestation)?
        .add_signature_block(&Signatories {
            prepared_by: Some(data.compliance_officer.clone()),
            approved_by: None,
        })?;

    finish(builder, Some(&data.period))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPosition {
    pub currency: String,
    pub opening_balance: f64,
    pub purchases: f64,
    pub sales: f64,
    /// US dollars per unit of the currency at the end of the month.
    #[serde(default = "unit_rate")]
    pub usd_rate: f64,
}

fn unit_rate() -> f64 {
    1.0
}

impl CurrencyPosition {
    pub fn closing_balance(&self) -> f64 {
        self.opening_balance + self.purchases - self.sales
    }

    pub fn usd_equivalent(&self) -> f64 {
        self.closing_balance() * self.usd_rate
    }
}

/// Figures of the monthly return to the Central Bank of Nigeria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CbnMonthlyReturnData {
    pub period: String,
    pub institution: String,
    pub institution_code: String,
    pub shareholders_funds: f64,
    pub positions: Vec<CurrencyPosition>,
    pub prepared_by: String,
    pub approved_by: String,
}

impl CbnMonthlyReturnData {
    /// Illustrative figures for demonstrating the report.
    pub fn sample(period: &str) -> Self {
        let position =
            |currency: &str, opening_balance: f64, purchases: f64, sales: f64, usd_rate: f64| {
                CurrencyPosition {
                    currency: currency.into(),
                    opening_balance,
                    purchases,
                    sales,
                    usd_rate,
                }
            };
        CbnMonthlyReturnData {
            period: period.into(),
            institution: "Example Bank Plc".into(),
            institution_code: "044".into(),
            shareholders_funds: 185_000_000.0,
            positions: vec![
                position("USD", 12_400_000.0, 38_500_000.0, 36_900_000.0, 1.0),
                position("EUR", 3_100_000.0, 7_250_000.0, 8_000_000.0, 1.08),
                position("GBP", 1_750_000.0, 2_900_000.0, 2_600_000.0, 1.27),
            ],
            prepared_by: "Financial Control".into(),
            approved_by: "Chief Financial Officer".into(),
        }
    }

    /// The sum of the closing balances of every position, converted into US dollars.
    pub fn net_open_position(&self) -> f64 {
        self.positions.iter().map(CurrencyPosition::usd_equivalent).sum()
    }
}

/// The monthly foreign currency position return to the Central Bank of Nigeria.
pub fn cbn_monthly_return(
    data: &CbnMonthlyReturnData,
    options: &ReportOptions,
    formatting: &dyn FormattingPolicy,
) -> Result<RenderedReport, ContextError> {
    let net_open_position = data.net_open_position();
    let net_open_position_ratio = if data.shareholders_funds == 0.0 {
        0.0
    } else {
        net_open_position.abs() * 100.0 / data.shareholders_funds
    };

    let config = DocumentConfig::new("CBN Monthly Return")
        .with_subtitle("Foreign Currency Position")
        .with_period(data.period.clone())
        .with_department("Financial Control")
        .with_generated_by(data.prepared_by.clone());
    let mut builder = ReportBuilder::generate(config, options)?;

    let positions = ReportTable::new(
        "Foreign Currency Positions",
        vec![
            TableColumn::new("Currency", "currency").with_width(22.0),
            TableColumn::new("Opening Balance", "opening"),
            TableColumn::new("Purchases", "purchases"),
            TableColumn::new("Sales", "sales"),
            TableColumn::new("Closing Balance", "closing"),
            TableColumn::new("USD Equivalent", "usdEquivalent"),
        ],
        data.positions
            .iter()
            .map(|position| {
                let currency = position.currency.as_str();
                Row::new()
                    .with("currency", currency)
                    .with("opening", formatting.format(position.opening_balance, currency))
                    .with("purchases", formatting.format(position.purchases, currency))
                    .with("sales", formatting.format(position.sales, currency))
                    .with("closing", formatting.format(position.closing_balance(), currency))
                    .with("usdEquivalent", formatting.format(position.usd_equivalent(), "USD"))
            })
            .collect(),
    );

    builder
        .add_section_title("Return Details")?
        .add_key_values(&[
            KeyValue::new("Institution", data.institution.as_str()),
            KeyValue::new("Institution Code", data.institution_code.as_str()),
            KeyValue::new("Reporting Month", data.period.as_str()),
            KeyValue::new(
                "Shareholders' Funds",
                formatting.format(data.shareholders_funds, "USD"),
            ),
        ])?
        .add_section_title("Positions")?
        .add_report_table(&positions)?
        .add_key_values(&[
            KeyValue::new(
                "Net Open Position",
                formatting.format(net_open_position, "USD"),
            ),
            KeyValue::new(
                "Net Open Position / Shareholders' Funds",
                formatting.format_percentage(net_open_position_ratio),
            ),
        ])?
        .add_divider()?
        .add_paragraph(
            "This return is submitted in line with the foreign exchange position reporting \
            requirements. Balances are stated in the currency of each position, and \
            the net open position in US dollars at the month-end rates.",
        )?
        .add_signature_block(&Signatories {
            prepared_by: Some(data.prepared_by.clone()),
            approved_by: Some(data.approved_by.clone()),
        })?;

    finish(builder, Some(&data.period))
}

/// An ad hoc report assembled from whatever tables and headline figures the caller picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomReportRequest {
    pub title: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub generated_by: Option<String>,
    #[serde(default)]
    pub summary: Vec<SummaryItem>,
    #[serde(default)]
    pub tables: Vec<ReportTable>,
    #[serde(default)]
    pub include_signatures: bool,
}

impl CustomReportRequest {
    /// Illustrative figures for demonstrating the report.
    pub fn sample(period: &str) -> Self {
        CustomReportRequest {
            title: "Counterparty Exposure Report".into(),
            period: Some(period.into()),
            description: Some(
                "Exposure to the most active interbank counterparties against their approved limits."
                    .into(),
            ),
            generated_by: Some("Treasury Risk".into()),
            summary: vec![
                SummaryItem::new("Counterparties", 3u32),
                SummaryItem::new("Total Exposure", "NGN 21,400,000,000.00"),
                SummaryItem::new("Limit Utilisation", "61.20%").with_trend(Trend::Up, "+4.0%"),
            ],
            tables: vec![ReportTable::new(
                "Exposure by Counterparty",
                vec![
                    TableColumn::new("Counterparty", "counterparty"),
                    TableColumn::new("Limit", "limit"),
                    TableColumn::new("Exposure", "exposure"),
                    TableColumn::new("Utilisation", "utilisation"),
                ],
                vec![
                    Row::new()
                        .with("counterparty", "Stanbic IBTC")
                        .with("limit", "NGN 15,000,000,000.00")
                        .with("exposure", "NGN 8,000,000,000.00")
                        .with("utilisation", "53.33%"),
                    Row::new()
                        .with("counterparty", "UBA")
                        .with("limit", "NGN 10,000,000,000.00")
                        .with("exposure", "NGN 7,900,000,000.00")
                        .with("utilisation", "79.00%"),
                    Row::new()
                        .with("counterparty", "Zenith Bank")
                        .with("limit", "NGN 10,000,000,000.00")
                        .with("exposure", "NGN 5,500,000,000.00")
                        .with("utilisation", "55.00%"),
                ],
            )],
            include_signatures: true,
        }
    }
}

/// Lays out a custom report: its description, its headline figures and then every table in order.
pub fn custom_report(
    request: &CustomReportRequest,
    options: &ReportOptions,
) -> Result<RenderedReport, ContextError> {
    let mut config = DocumentConfig::new(request.title.clone()).with_subtitle("Custom Report");
    config.period = request.period.clone();
    config.generated_by = request.generated_by.clone();
    let mut builder = ReportBuilder::generate(config, options)?;

    if let Some(description) = &request.description {
        builder.add_paragraph(description)?;
    }
    if !request.summary.is_empty() {
        builder
            .add_section_title("Summary")?
            .add_summary_cards(&request.summary)?;
    }
    for table in request.tables.iter() {
        builder.add_report_table(table)?;
    }
    if request.include_signatures {
        builder.add_signature_block(&Signatories::default())?;
    }

    finish(builder, request.period.as_deref())
}
