use sqlgen_derive::Sqlgen;

/// sqlgen:model users
#[derive(Debug, Default, Sqlgen)]
pub struct User {
    #[sqlgen(model = "id,BIGINT")]
    pub id: i64,
    #[sqlgen(model = "name,TEXT;index,role")]
    pub name: String,
    #[sqlgen(model = "role,TEXT")]
    pub role: String,
}

/// sqlgen:query User
#[derive(Debug, Default, Sqlgen)]
pub struct UserName {
    #[sqlgen(query = "id")]
    pub id: i64,
    #[sqlgen(query = "name;getgroup;getoneeq,id;deleq,role|in")]
    pub name: String,
}
