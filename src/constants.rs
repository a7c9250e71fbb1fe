pub mod limits {

    pub const MAX_NAME_LENGTH: usize = 200;

    pub const MAX_TEXT_LENGTH: usize = 10_000;

    pub const MAX_SLUG_LENGTH: usize = 50;

    pub const MAX_EMAIL_LENGTH: usize = 254;

    pub const MAX_USERNAME_LENGTH: usize = 150;

    pub const MAX_PERSON_NAME_LENGTH: usize = 150;

    pub const MIN_PASSWORD_LENGTH: usize = 8;

    pub const MAX_PASSWORD_LENGTH: usize = 128;
}

pub mod auth {

    pub const TOKEN_BYTES: usize = 20;

    pub const TOKEN_PREFIX: &str = "Token ";

    pub const BEARER_PREFIX: &str = "Bearer ";
}

pub mod shopping_list {

    pub const DEFAULT_FILENAME: &str = "foodgram_shopping_cart.txt";

    pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";
}
