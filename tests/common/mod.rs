use dkim_signer::{
    crypto::SigningKey,
    header::FieldName,
    signer::{HeaderSelection, Signer, SigningConfig, Timestamp},
    signature::{DomainName, Selector},
};
use std::io;
use tokio::fs;

pub const EML1: &str = "A: X \r\n\
B : Y\t\r\n\
\tZ  \r\n\
\r\n \
C \r\n\
D \t E\r\n\
\r\n\
\r\n";

pub const EML2: &str = "From: Joe SixPack <joe@football.example.com>\r\n\
To: Suzie Q <suzie@shopping.example.net>\r\n\
Subject: Is dinner ready?\r\n\
Date: Fri, 11 Jul 2003 21:00:37 -0700 (PDT)\r\n\
Message-ID: <20030712040037.46341.5F8J@football.example.com>\r\n\
\r\n\
Hi.\r\n\
\r\n\
We lost the game. Are you hungry yet?\r\n\
\r\n\
Joe.\r\n";

pub const EML3: &str = "Return-Path: aws@s3ig.com\r\n\
MIME-Version: 1.0\r\n\
From: aws@s3ig.com\r\n\
To: check-auth@verifier.port25.com\r\n\
Reply-To: aws@s3ig.com\r\n\
Date: 10 Mar 2011 10:41:56 +0000\r\n\
Subject: dkim test email\r\n\
Content-Type: text/plain; charset=us-ascii\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
This is the body of \t the message.=0D=0AThis is the second line\r\n\
\r\n";

pub async fn read_signing_key_from_file(file_name: &str) -> io::Result<SigningKey> {
    let s = fs::read_to_string(file_name).await?;
    SigningKey::from_pem(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn make_field_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<FieldName> {
    names
        .into_iter()
        .map(|name| FieldName::new(name).unwrap())
        .collect()
}

/// The configuration used for the reference signatures of `EML3`.
pub fn make_s3ig_config() -> SigningConfig {
    let mut config = SigningConfig::new(
        DomainName::new("s3ig.com").unwrap(),
        Selector::new("dkim").unwrap(),
    );
    config.canonicalization = "relaxed/relaxed".parse().unwrap();
    config.timestamp = Timestamp::Exact(1299753716);
    config.header_selection =
        HeaderSelection::Manual(make_field_names(["Content-Type", "From", "Subject", "To"]));
    config
}

pub async fn make_s3ig_signer() -> Signer {
    let signing_key = read_signing_key_from_file("tests/keys/fixture_pkcs1.pem").await.unwrap();
    Signer::new(make_s3ig_config(), signing_key).unwrap()
}
