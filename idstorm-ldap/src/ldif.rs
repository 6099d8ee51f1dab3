//! LDIF rendering for generated identities

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use idstorm_core::IdentityRecord;
use std::fmt::Write as _;

const OBJECT_CLASSES: [&str; 5] = [
    "top",
    "person",
    "organizationalPerson",
    "inetOrgPerson",
    "posixAccount",
];

/// `uid={uid},{base_dn}` with the uid escaped as an RDN value
pub fn entry_dn(uid: &str, base_dn: &str) -> String {
    format!("uid={},{}", escape_rdn_value(uid), base_dn)
}

/// LDIF for adding the record's entry
pub fn add_entry(dn: &str, record: &IdentityRecord, password: Option<&str>) -> String {
    let mut ldif = String::new();
    push_attr(&mut ldif, "dn", dn);
    for class in OBJECT_CLASSES {
        push_attr(&mut ldif, "objectClass", class);
    }
    push_attr(&mut ldif, "cn", &record.display_name);
    push_attr(&mut ldif, "sn", &record.surname);
    push_attr(&mut ldif, "uid", &record.uid);
    push_attr(&mut ldif, "uidNumber", &record.uid_number.to_string());
    push_attr(&mut ldif, "gidNumber", &record.gid_number.to_string());
    push_attr(&mut ldif, "homeDirectory", &record.home_directory);
    if !record.description.is_empty() {
        push_attr(&mut ldif, "description", &record.description);
    }
    if let Some(password) = password {
        push_attr(&mut ldif, "userPassword", password);
    }
    ldif
}

/// LDIF replacing the entry's description
pub fn replace_description(dn: &str, description: &str) -> String {
    let mut ldif = String::new();
    push_attr(&mut ldif, "dn", dn);
    push_attr(&mut ldif, "changetype", "modify");
    push_attr(&mut ldif, "replace", "description");
    push_attr(&mut ldif, "description", description);
    ldif.push_str("-\n");
    ldif
}

fn push_attr(ldif: &mut String, name: &str, value: &str) {
    // Writing into a String cannot fail
    if is_safe_string(value) {
        let _ = writeln!(ldif, "{}: {}", name, value);
    } else {
        let _ = writeln!(ldif, "{}:: {}", name, STANDARD.encode(value));
    }
}

/// RFC 2849 SAFE-STRING
fn is_safe_string(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.first() {
        None => return true,
        Some(b' ' | b':' | b'<') => return false,
        Some(_) => {}
    }
    bytes.last() != Some(&b' ')
        && bytes
            .iter()
            .all(|b| b.is_ascii() && !matches!(b, b'\0' | b'\n' | b'\r'))
}

/// RFC 4514 escaping of an attribute value inside a DN
fn escape_rdn_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let leading = i == 0 && (c == ' ' || c == '#');
        let trailing = i + 1 == value.chars().count() && c == ' ';
        if leading || trailing || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use idstorm_core::{OperationKind, RecordId, RecordTemplate};

    #[test]
    fn test_add_entry_attributes() {
        let record = RecordTemplate::new("user_ldap_", "t").render(RecordId::new(12), OperationKind::Create);
        let dn = entry_dn(&record.uid, "dc=example,dc=org");
        let ldif = add_entry(&dn, &record, Some("password123"));

        assert!(ldif.starts_with("dn: uid=user_ldap_12,dc=example,dc=org\n"));
        assert_eq!(ldif.matches("objectClass: ").count(), 5);
        assert!(ldif.contains("objectClass: posixAccount\n"));
        assert!(ldif.contains("cn: Test User 12\n"));
        assert!(ldif.contains("uidNumber: 10012\n"));
        assert!(ldif.contains("gidNumber: 500\n"));
        assert!(ldif.contains("homeDirectory: /home/user_ldap_12\n"));
        assert!(ldif.contains("userPassword: password123\n"));
    }

    #[test]
    fn test_replace_description() {
        let ldif = replace_description("uid=u1,dc=x", "Modified at 09:15:00 (persistent round)");
        assert_eq!(
            ldif,
            "dn: uid=u1,dc=x\nchangetype: modify\nreplace: description\ndescription: Modified at 09:15:00 (persistent round)\n-\n"
        );
    }

    #[test]
    fn test_unsafe_values_are_base64() {
        let mut ldif = String::new();
        push_attr(&mut ldif, "description", ":starts with colon");
        assert_eq!(ldif, format!("description:: {}\n", STANDARD.encode(":starts with colon")));

        let mut accented = String::new();
        push_attr(&mut accented, "cn", "Jos\u{e9}");
        assert!(accented.starts_with("cn:: "));
    }

    #[test]
    fn test_dn_escaping() {
        assert_eq!(entry_dn("a,b", "dc=x"), "uid=a\\,b,dc=x");
        assert_eq!(entry_dn("#lead", "dc=x"), "uid=\\#lead,dc=x");
        assert_eq!(entry_dn("plain_1", "dc=x"), "uid=plain_1,dc=x");
    }
}
