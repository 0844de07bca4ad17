//! Hosted button management (Button Manager API).
//!
//! Button Manager names its option fields with the same numbered-template
//! scheme as checkout line items. One dropdown menu per button is supported
//! here, so every template resolves at index 0.

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::{FieldMap, IndexedField, NestedField},
    response::{NvpResponse, Outcome},
    transport::{NvpTransport, RequestTrace},
    types::{self, BillingPeriod, ButtonType, OptionType},
};

const CREATE_BUTTON: &str = "BMCreateButton";
const UPDATE_BUTTON: &str = "BMUpdateButton";
const GET_BUTTON: &str = "BMGetButtonDetails";
const GET_INVENTORY: &str = "BMGetInventory";
const MANAGE_STATUS: &str = "BMManageButtonStatus";
const SEARCH: &str = "BMButtonSearch";

const BUTTON_TYPE: &str = "BUTTONTYPE";
const STATUS: &str = "STATUS";
const DELETE: &str = "DELETE";
const START: &str = "STARTDATE";
const END: &str = "ENDDATE";

// Dropdown menu fields, `n` selects the menu and `m` the menu item.
const OPTION_NAME: IndexedField = IndexedField::new("OPTION", "NAME");
const OPTION_TYPE: IndexedField = IndexedField::new("OPTION", "TYPE");
const OPTION_SELECT: NestedField = NestedField::new("L_OPTION", "SELECT", "");
const OPTION_PRICE: NestedField = NestedField::new("L_OPTION", "PRICE", "");
const BILLING_PERIOD: NestedField = NestedField::new("L_OPTION", "BILLINGPERIOD", "");
const BILLING_FREQUENCY: NestedField = NestedField::new("L_OPTION", "BILLINGFREQUENCY", "");
const BILLING_TOTAL: NestedField = NestedField::new("L_OPTION", "TOTALBILLINGCYCLES", "");
const OPTION_AMOUNT: NestedField = NestedField::new("L_OPTION", "AMOUNT", "");
const SHIPPING_AMOUNT: NestedField = NestedField::new("L_OPTION", "SHIPPINGAMOUNT", "");
const TAX_AMOUNT: NestedField = NestedField::new("L_OPTION", "TAXAMOUNT", "");

/// Create, update, inspect and delete hosted payment buttons.
#[derive(Debug)]
pub struct Button {
    transport: NvpTransport,
    button_id: Option<String>,
    button_type: Option<ButtonType>,
    option_name: Option<String>,
    option_select: Option<String>,
    option_price: Option<Decimal>,
    option_type: Option<OptionType>,
    billing_period: Option<BillingPeriod>,
    billing_frequency: Option<u32>,
    billing_total: Option<u32>,
    option_amount: Option<Decimal>,
    shipping_amount: Option<Decimal>,
    tax_amount: Option<Decimal>,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
}

impl Button {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            button_id: None,
            button_type: None,
            option_name: None,
            option_select: None,
            option_price: None,
            option_type: None,
            billing_period: None,
            billing_frequency: None,
            billing_total: None,
            option_amount: None,
            shipping_amount: None,
            tax_amount: None,
            start: None,
            end: None,
        }
    }

    /// Hosted button id of an existing button.
    pub fn button_id(&mut self, button_id: impl Into<String>) -> &mut Self {
        self.button_id = Some(button_id.into());
        self
    }

    /// The kind of button to create.
    pub fn button_type(&mut self, button_type: ButtonType) -> &mut Self {
        self.button_type = Some(button_type);
        self
    }

    /// Name of the dropdown menu.
    pub fn option_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.option_name = Some(name.into());
        self
    }

    /// Name of the first menu item.
    pub fn option_select(&mut self, select: impl Into<String>) -> &mut Self {
        self.option_select = Some(select.into());
        self
    }

    /// Price associated with the first menu item.
    pub fn option_price(&mut self, price: Decimal) -> &mut Self {
        self.option_price = Some(price);
        self
    }

    /// Installment option kind for the menu.
    pub fn option_type(&mut self, option_type: OptionType) -> &mut Self {
        self.option_type = Some(option_type);
        self
    }

    /// The installment cycle unit.
    pub fn billing_period(&mut self, period: BillingPeriod) -> &mut Self {
        self.billing_period = Some(period);
        self
    }

    /// Installment cycle frequency in billing period units.
    pub fn billing_frequency(&mut self, frequency: u32) -> &mut Self {
        self.billing_frequency = Some(frequency);
        self
    }

    /// Total number of billing cycles.
    pub fn billing_total(&mut self, total: u32) -> &mut Self {
        self.billing_total = Some(total);
        self
    }

    /// Base amount to bill per cycle.
    pub fn amount(&mut self, amount: Decimal) -> &mut Self {
        self.option_amount = Some(amount);
        self
    }

    /// Shipping amount to bill per cycle.
    pub fn shipping_amount(&mut self, amount: Decimal) -> &mut Self {
        self.shipping_amount = Some(amount);
        self
    }

    /// Tax amount to bill per cycle.
    pub fn tax_amount(&mut self, amount: Decimal) -> &mut Self {
        self.tax_amount = Some(amount);
        self
    }

    /// Earliest button creation date included in a search.
    pub fn start_date(&mut self, start: OffsetDateTime) -> &mut Self {
        self.start = Some(start);
        self
    }

    /// Latest button creation date included in a search.
    pub fn end_date(&mut self, end: OffsetDateTime) -> &mut Self {
        self.end = Some(end);
        self
    }

    /// Create a hosted button. When the response carries a
    /// `HOSTEDBUTTONID` it is recorded and one follow-up details call is
    /// made immediately; its full response is the success value. Otherwise
    /// the create response comes back verbatim.
    pub fn create(&mut self) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        let response = self.transport.send(CREATE_BUTTON, self.button_fields())?;
        self.chain_details(response)
    }

    /// Update an existing hosted button, then fetch its details the same
    /// way `create` does.
    pub fn update(&mut self) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        let mut query = self.button_fields();
        query.insert_opt(consts::HOSTED_BUTTON_ID, self.button_id.clone());
        let response = self.transport.send(UPDATE_BUTTON, query)?;
        self.chain_details(response)
    }

    /// Inventory levels and related information for the configured button.
    pub fn inventory(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::HOSTED_BUTTON_ID, self.button_id.clone());
        self.transport.send(GET_INVENTORY, query)
    }

    /// Delete the configured button. Deletion is the only status change the
    /// API supports.
    pub fn remove(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::HOSTED_BUTTON_ID, self.button_id.clone());
        query.insert(STATUS, DELETE);
        self.transport.send(MANAGE_STATUS, query)
    }

    /// List hosted buttons created inside the configured date window.
    pub fn search(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        if let Some(start) = self.start {
            query.insert(START, types::format_utc(start)?);
        }
        if let Some(end) = self.end {
            query.insert(END, types::format_utc(end)?);
        }
        self.transport.send(SEARCH, query)
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }

    fn chain_details(
        &mut self,
        response: NvpResponse,
    ) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        if let Some(button_id) = response
            .get(consts::HOSTED_BUTTON_ID)
            .filter(|button_id| !button_id.is_empty())
        {
            self.button_id = Some(button_id.to_owned());
            let mut query = FieldMap::new();
            query.insert(consts::HOSTED_BUTTON_ID, button_id);
            return Ok(Outcome::Success(self.transport.send(GET_BUTTON, query)?));
        }
        Ok(Outcome::Other(response))
    }

    fn button_fields(&self) -> FieldMap {
        let mut query = FieldMap::new();
        query.insert_opt(BUTTON_TYPE, self.button_type);
        query.insert_opt(OPTION_NAME.at(0), self.option_name.clone());
        query.insert_opt(OPTION_TYPE.at(0), self.option_type);
        query.insert_opt(OPTION_SELECT.at(0, 0), self.option_select.clone());
        query.insert_opt(OPTION_PRICE.at(0, 0), self.option_price);
        query.insert_opt(BILLING_PERIOD.at(0, 0), self.billing_period);
        query.insert_opt(BILLING_FREQUENCY.at(0, 0), self.billing_frequency);
        query.insert_opt(BILLING_TOTAL.at(0, 0), self.billing_total);
        query.insert_opt(OPTION_AMOUNT.at(0, 0), self.option_amount);
        query.insert_opt(SHIPPING_AMOUNT.at(0, 0), self.shipping_amount);
        query.insert_opt(TAX_AMOUNT.at(0, 0), self.tax_amount);
        query
    }
}
