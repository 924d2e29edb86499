//! Static report schemas: the fixed columns of every report and the ordered
//! source-key aliases each column accepts. Alias order is precedence order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    /// Seconds rendered as `H:MM:SS` / `M:SS`.
    Duration,
    /// Epoch or date string rendered as `DD/MM/YYYY HH:mm`.
    DateTime,
    /// 1 Online, 0 Offline, -1 Abnormal.
    DeviceStatus,
    /// 1/true Yes, 0/false No.
    YesNo,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub aliases: &'static [&'static str],
}

/// 不在別名表裡的原始欄位如何處理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraColumns {
    /// 全部保留，標題由 key 轉換
    Unmapped,
    /// 只保留 key 含有指定字串 (不分大小寫) 的欄位，標題照原樣
    KeyContains(&'static str),
    Omit,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    pub extras: ExtraColumns,
}

impl ReportSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Extra columns are always plain.
    pub fn kind_of(&self, key: &str) -> FieldKind {
        self.field(key).map(|f| f.kind).unwrap_or(FieldKind::Plain)
    }

    pub fn is_alias(&self, raw_key: &str) -> bool {
        self.fields.iter().any(|f| f.aliases.contains(&raw_key))
    }

    pub fn keeps_extra(&self, raw_key: &str) -> bool {
        if self.field(raw_key).is_some() || self.is_alias(raw_key) {
            return false;
        }
        match self.extras {
            ExtraColumns::Unmapped => true,
            ExtraColumns::KeyContains(needle) => {
                raw_key.to_lowercase().contains(&needle.to_lowercase())
            }
            ExtraColumns::Omit => false,
        }
    }
}

const fn field(
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    aliases: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind,
        aliases,
    }
}

pub const CDR_SCHEMA: ReportSchema = ReportSchema {
    name: "CDR Report",
    fields: &[
        field("caller", "Caller", FieldKind::Plain, &["caller"]),
        field("callee", "Callee", FieldKind::Plain, &["callee", "endpoint"]),
        field(
            "call_type",
            "Call Type",
            FieldKind::Plain,
            &["call_type", "calltype", "call type"],
        ),
        field(
            "start_time",
            "Start Time",
            FieldKind::DateTime,
            &["start_time", "StartTime", "date_from", "start", "starttime"],
        ),
        field(
            "end_time",
            "End Time",
            FieldKind::DateTime,
            &["end_time", "EndTime", "date_to", "end", "endtime"],
        ),
        field(
            "session_time",
            "Session Time",
            FieldKind::Duration,
            &["session_time", "SessionTime", "sessionTime", "sessiontime"],
        ),
        field(
            "bridge_time",
            "Bridge Time",
            FieldKind::Duration,
            &[
                "bridge_time",
                "BridgeTime",
                "BrideTime",
                "Bridgetime",
                "brigetime",
                "bridgetime",
            ],
        ),
        field(
            "call_status",
            "Call Status",
            FieldKind::Plain,
            &["call_status", "CallStatus", "termdescription", "status"],
        ),
        field(
            "dtmf",
            "DTMF",
            FieldKind::Plain,
            &["dtmf", "DTMF", "digits", "dtmf_code"],
        ),
        field("uuid", "UUID", FieldKind::Plain, &["uuid"]),
        field("category", "Category", FieldKind::Plain, &["category"]),
        field(
            "subcategory",
            "Subcategory",
            FieldKind::Plain,
            &["subcategory", "Sub Category", "SubCategory"],
        ),
    ],
    extras: ExtraColumns::Unmapped,
};

pub const DEVICE_SCHEMA: ReportSchema = ReportSchema {
    name: "MAC Report",
    fields: &[
        field("mac_address", "MAC Address", FieldKind::Plain, &["macAddress", "mac"]),
        field("sn", "SN", FieldKind::Plain, &["sn"]),
        field(
            "device_name",
            "Device Name",
            FieldKind::Plain,
            &["deviceName", "devicename"],
        ),
        field("site_name", "Site Name", FieldKind::Plain, &["siteName"]),
        field(
            "device_model",
            "Device Model",
            FieldKind::Plain,
            &["deviceModel", "deviceType"],
        ),
        field(
            "firmware_version",
            "Firmware Version",
            FieldKind::Plain,
            &["firmwareVersion"],
        ),
        field(
            "device_status",
            "Device Status",
            FieldKind::DeviceStatus,
            &["deviceStatus", "status"],
        ),
        field(
            "push_configuration",
            "Push Configuration",
            FieldKind::YesNo,
            &["pushConfiguration", "isSynchronized"],
        ),
        field(
            "last_config_time",
            "Last Config Time",
            FieldKind::Plain,
            &["lastConfigTime", "lastTime"],
        ),
        field(
            "account1_user_id",
            "Account 1 User ID",
            FieldKind::Plain,
            &["account1UserId", "sipUserId"],
        ),
        field(
            "account1_sip_server",
            "Account 1 SIP Server",
            FieldKind::Plain,
            &["account1SipServer", "sipServer"],
        ),
    ],
    extras: ExtraColumns::Omit,
};

pub const SIP_SCHEMA: ReportSchema = ReportSchema {
    name: "SIP Report",
    fields: &[
        field("account_name", "SIP Account Name", FieldKind::Plain, &["accountName"]),
        field("sip_server", "SIP Server", FieldKind::Plain, &["sipServer"]),
        field("sip_user_id", "SIP User ID", FieldKind::Plain, &["sipUserId"]),
        field("display_name", "Display Name", FieldKind::Plain, &["displayName"]),
        field(
            "active_status",
            "SIP Account Active Status",
            FieldKind::Plain,
            &["sipAccountActiveStatus"],
        ),
    ],
    extras: ExtraColumns::KeyContains("mac"),
};
