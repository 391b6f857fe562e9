//! Capabilities, job titles and the default grant table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{ConfigError, ServiceError};

/// Detail sent when a request carries no credentials at all.
pub const MISSING_TOKEN_DETAIL: &str = "Access token is missing in the request header. \
     Include a valid access token in the 'Authorization' header and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    RegisterGuest,
    UpdateGuestInfo,
    CreateRoom,
    UpdateRoomInfo,
    UpdateRoomStatus,
    BookingARoom,
    GiftBookingARoom,
    VoidBookingARoom,
    UpdateBookingInfo,
    UpdateBookingPrice,
    AcceptAccommodationPayment,
    UpdateAccommodationPayment,
    MakeMenu,
    UpdateMenu,
    UpdateMenuPrice,
    ViewMyOrder,
    ViewAllOrder,
    PostOrder,
    UpdateOrder,
    UpdateAllOrder,
    GiftOrder,
    VoidOrder,
    TransferOrder,
    AcceptRestaurantPayment,
    UpdateRestaurantPayment,
    AddItemToInventory,
    UpdateItemInfo,
    MakeMenuVsRecipe,
    SpoilageMiscellaneousUsage,
    IssueItem,
    UpdateIssue,
    PurchaseItem,
    UpdatePurchase,
    RegisterEmployee,
    UpdateEmployeeInfo,
    UpdateEmployeePermissions,
    AddExpense,
    UpdateExpense,
    VerifyPayment,
    GenerateMyReport,
    GenerateAccommodationReport,
    GenerateRestaurantReport,
    GenerateInventoryReport,
    GenerateGeneralReport,
}

impl Permission {
    pub const ALL: [Self; 44] = {
        use Permission::*;
        [
            RegisterGuest, UpdateGuestInfo, CreateRoom, UpdateRoomInfo, UpdateRoomStatus, BookingARoom,
            GiftBookingARoom, VoidBookingARoom, UpdateBookingInfo, UpdateBookingPrice,
            AcceptAccommodationPayment, UpdateAccommodationPayment, MakeMenu, UpdateMenu, UpdateMenuPrice,
            ViewMyOrder, ViewAllOrder, PostOrder, UpdateOrder, UpdateAllOrder, GiftOrder, VoidOrder,
            TransferOrder, AcceptRestaurantPayment, UpdateRestaurantPayment, AddItemToInventory,
            UpdateItemInfo, MakeMenuVsRecipe, SpoilageMiscellaneousUsage, IssueItem, UpdateIssue,
            PurchaseItem, UpdatePurchase, RegisterEmployee, UpdateEmployeeInfo, UpdateEmployeePermissions,
            AddExpense, UpdateExpense, VerifyPayment, GenerateMyReport, GenerateAccommodationReport,
            GenerateRestaurantReport, GenerateInventoryReport, GenerateGeneralReport,
        ]
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobTitle {
    #[serde(rename = "general manager")]
    GeneralManager,
    #[serde(rename = "supervisor")]
    Supervisor,
    #[serde(rename = "accommodation supervisor")]
    AccommodationSupervisor,
    #[serde(rename = "reception")]
    Reception,
    #[serde(rename = "housekeeper")]
    Housekeeper,
    #[serde(rename = "security")]
    Security,
    #[serde(rename = "restaurant supervisor")]
    RestaurantSupervisor,
    #[serde(rename = "cashier")]
    Cashier,
    #[serde(rename = "waiter")]
    Waiter,
    #[serde(rename = "chef")]
    Chef,
    #[serde(rename = "cook")]
    Cook,
    #[serde(rename = "steward")]
    Steward,
    #[serde(rename = "trainee")]
    Trainee,
    #[serde(rename = "handyman")]
    Handyman,
    #[serde(rename = "storekeeper")]
    Storekeeper,
    #[serde(rename = "software admin")]
    SoftwareAdmin,
}

impl JobTitle {
    pub const ALL: [Self; 16] = [
        Self::GeneralManager,
        Self::Supervisor,
        Self::AccommodationSupervisor,
        Self::Reception,
        Self::Housekeeper,
        Self::Security,
        Self::RestaurantSupervisor,
        Self::Cashier,
        Self::Waiter,
        Self::Chef,
        Self::Cook,
        Self::Steward,
        Self::Trainee,
        Self::Handyman,
        Self::Storekeeper,
        Self::SoftwareAdmin,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GeneralManager => "general manager",
            Self::Supervisor => "supervisor",
            Self::AccommodationSupervisor => "accommodation supervisor",
            Self::Reception => "reception",
            Self::Housekeeper => "housekeeper",
            Self::Security => "security",
            Self::RestaurantSupervisor => "restaurant supervisor",
            Self::Cashier => "cashier",
            Self::Waiter => "waiter",
            Self::Chef => "chef",
            Self::Cook => "cook",
            Self::Steward => "steward",
            Self::Trainee => "trainee",
            Self::Handyman => "handyman",
            Self::Storekeeper => "storekeeper",
            Self::SoftwareAdmin => "software admin",
        }
    }
}

impl fmt::Display for JobTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobTitle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue { key: "jobTitle".into(), value: s.to_string() })
    }
}

/// Default permissions per job title. Built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable(BTreeMap<JobTitle, Vec<Permission>>);

impl PermissionTable {
    #[must_use]
    pub fn defaults() -> Self {
        use Permission::*;
        let restricted: [(JobTitle, &[Permission]); 14] = [
            (JobTitle::Supervisor, &[
                RegisterGuest, UpdateGuestInfo, CreateRoom, UpdateRoomInfo, UpdateRoomStatus, BookingARoom,
                GiftBookingARoom, VoidBookingARoom, UpdateBookingInfo, UpdateBookingPrice,
                AcceptAccommodationPayment, UpdateAccommodationPayment, MakeMenu, UpdateMenu, UpdateMenuPrice,
                ViewMyOrder, ViewAllOrder, PostOrder, UpdateOrder, UpdateAllOrder, GiftOrder, VoidOrder,
                TransferOrder, AcceptRestaurantPayment, UpdateRestaurantPayment, AddItemToInventory,
                UpdateItemInfo, MakeMenuVsRecipe, SpoilageMiscellaneousUsage, IssueItem, UpdateIssue,
                PurchaseItem, UpdatePurchase, RegisterEmployee, UpdateEmployeeInfo, AddExpense, UpdateExpense,
                GenerateMyReport, GenerateAccommodationReport, GenerateRestaurantReport, GenerateInventoryReport,
            ]),
            (JobTitle::AccommodationSupervisor, &[
                RegisterGuest, UpdateGuestInfo, CreateRoom, UpdateRoomInfo, UpdateRoomStatus, BookingARoom,
                GiftBookingARoom, VoidBookingARoom, UpdateBookingInfo, UpdateBookingPrice,
                AcceptAccommodationPayment, UpdateAccommodationPayment, RegisterEmployee, UpdateEmployeeInfo,
                AddExpense, UpdateExpense, GenerateMyReport, GenerateAccommodationReport, GenerateInventoryReport,
            ]),
            (JobTitle::Reception, &[
                RegisterGuest, UpdateGuestInfo, CreateRoom, UpdateRoomInfo, UpdateRoomStatus, BookingARoom,
                VoidBookingARoom, UpdateBookingInfo, UpdateBookingPrice, AcceptAccommodationPayment,
                UpdateAccommodationPayment, AddExpense, UpdateExpense, GenerateMyReport,
                GenerateAccommodationReport,
            ]),
            (JobTitle::Housekeeper, &[CreateRoom, UpdateRoomInfo, UpdateRoomStatus, GenerateMyReport]),
            (JobTitle::Security, &[CreateRoom, UpdateRoomInfo, UpdateRoomStatus, GenerateMyReport]),
            (JobTitle::RestaurantSupervisor, &[
                MakeMenu, UpdateMenu, UpdateMenuPrice, ViewMyOrder, ViewAllOrder, PostOrder, UpdateOrder,
                UpdateAllOrder, GiftOrder, VoidOrder, TransferOrder, AcceptRestaurantPayment,
                UpdateRestaurantPayment, AddItemToInventory, UpdateItemInfo, MakeMenuVsRecipe,
                SpoilageMiscellaneousUsage, IssueItem, UpdateIssue, PurchaseItem, UpdatePurchase,
                RegisterEmployee, UpdateEmployeeInfo, AddExpense, UpdateExpense, GenerateMyReport,
                GenerateRestaurantReport, GenerateInventoryReport,
            ]),
            (JobTitle::Cashier, &[
                MakeMenu, UpdateMenu, UpdateMenuPrice, ViewMyOrder, ViewAllOrder, PostOrder, UpdateOrder,
                UpdateAllOrder, GiftOrder, VoidOrder, TransferOrder, AcceptRestaurantPayment,
                UpdateRestaurantPayment, AddExpense, UpdateExpense, GenerateMyReport, GenerateRestaurantReport,
            ]),
            (JobTitle::Waiter, &[
                ViewMyOrder, PostOrder, UpdateOrder, UpdateAllOrder, GiftOrder, VoidOrder, TransferOrder,
                AcceptRestaurantPayment, UpdateRestaurantPayment, GenerateMyReport,
            ]),
            (JobTitle::Chef, &[
                ViewMyOrder, ViewAllOrder, AddItemToInventory, UpdateItemInfo, MakeMenuVsRecipe,
                SpoilageMiscellaneousUsage, GenerateMyReport, GenerateInventoryReport,
            ]),
            (JobTitle::Cook, &[
                ViewMyOrder, ViewAllOrder, AddItemToInventory, UpdateItemInfo, MakeMenuVsRecipe,
                SpoilageMiscellaneousUsage, GenerateMyReport, GenerateInventoryReport,
            ]),
            (JobTitle::Steward, &[ViewMyOrder, ViewAllOrder, SpoilageMiscellaneousUsage, GenerateMyReport]),
            (JobTitle::Trainee, &[
                ViewMyOrder, PostOrder, UpdateOrder, AcceptRestaurantPayment, UpdateRestaurantPayment,
                GenerateMyReport,
            ]),
            (JobTitle::Handyman, &[UpdateRoomInfo, GenerateMyReport]),
            (JobTitle::Storekeeper, &[
                MakeMenu, UpdateMenu, UpdateMenuPrice, ViewMyOrder, ViewAllOrder, AddItemToInventory,
                UpdateItemInfo, MakeMenuVsRecipe, SpoilageMiscellaneousUsage, IssueItem, UpdateIssue,
                PurchaseItem, UpdatePurchase, AddExpense, UpdateExpense, GenerateMyReport,
                GenerateRestaurantReport, GenerateInventoryReport,
            ]),
        ];

        let mut table: BTreeMap<JobTitle, Vec<Permission>> =
            restricted.into_iter().map(|(title, perms)| (title, perms.to_vec())).collect();
        table.insert(JobTitle::GeneralManager, Permission::ALL.to_vec());
        table.insert(JobTitle::SoftwareAdmin, Permission::ALL.to_vec());
        Self(table)
    }

    /// The defaults with each configured title's list replaced wholesale.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<JobTitle, Vec<Permission>>) -> Self {
        let mut table = Self::defaults();
        for (title, perms) in overrides {
            table.0.insert(*title, perms.clone());
        }
        table
    }

    #[must_use]
    pub fn for_title(&self, title: JobTitle) -> &[Permission] {
        self.0.get(&title).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobTitle, &[Permission])> {
        self.0.iter().map(|(t, p)| (*t, p.as_slice()))
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Checks a caller's grants against a route's requirements.
///
/// # Errors
/// `Unauthenticated` when there is no caller, `Unauthorized` when any required
/// permission is missing.
pub fn authorize(granted: Option<&[Permission]>, required: &[Permission]) -> Result<(), ServiceError> {
    let granted = granted.ok_or_else(|| ServiceError::Unauthenticated(Some(MISSING_TOKEN_DETAIL.to_string())))?;
    let missing: Vec<&Permission> = required.iter().filter(|p| !granted.contains(p)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        log::debug!("caller lacks {missing:?}");
        Err(ServiceError::Unauthorized(None))
    }
}
